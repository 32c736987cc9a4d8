//! Services the controller core needs from its environment

use crate::bridge::{DownstreamSink, InterfaceKind};
use crate::interface::RegisterMap;
use crate::Error;
use alloc::boxed::Box;

/// A gateable clock with adjustable rate
pub trait Clock {
    /// ungate the clock
    fn enable(&mut self) -> Result<(), Error>;

    /// gate the clock
    fn disable(&mut self);

    /// rate in Hz the clock would run at when asked for rate_hz, zero or negative if unreachable
    fn round_rate(&self, rate_hz: u64) -> i64;

    /// change the clock rate
    fn set_rate(&mut self, rate_hz: u64) -> Result<(), Error>;
}

/// The reset lines of the controller, handled as one group
pub trait ResetLines {
    /// put the controller into reset
    fn assert(&mut self) -> Result<(), Error>;

    /// release the controller from reset
    fn deassert(&mut self) -> Result<(), Error>;
}

/// Description of the display graph around the controller
pub trait DisplayGraph {
    /// number of output ports
    fn port_count(&self) -> usize;

    /// checks if the port has a downstream endpoint of the given interface kind
    fn has_endpoint(&self, port: usize, kind: InterfaceKind) -> bool;

    /// resolves the downstream sink connected to the endpoint
    fn downstream_sink(
        &mut self,
        port: usize,
        kind: InterfaceKind,
    ) -> Result<Box<dyn DownstreamSink>, Error>;
}

/// Resource binding of a controller instance
pub trait Platform: DisplayGraph {
    /// register access
    type Registers: RegisterMap;
    /// clock handles
    type Clock: Clock;
    /// reset line group
    type Resets: ResetLines;

    /// acquire the named reset lines
    fn resets(&mut self, names: &[&'static str]) -> Result<Self::Resets, Error>;

    /// acquire a named clock, the clock is not enabled yet
    fn clock(&mut self, name: &'static str) -> Result<Self::Clock, Error>;

    /// interrupt line of the controller
    fn irq(&mut self) -> Result<u32, Error>;

    /// map the register window, only called after the resets are released
    fn map_registers(&mut self) -> Result<Self::Registers, Error>;
}
