//! Fake platform used by the unit tests

use crate::bridge::{DownstreamSink, InterfaceKind, PassThrough};
use crate::interface::{self, RegisterMap};
use crate::platform::{Clock, DisplayGraph, Platform, ResetLines};
use crate::register;
use crate::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Log of platform events, shared by all fakes of one platform
pub type Events = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
struct RegisterState {
    values: HashMap<u32, u32>,
    writes: Vec<(u32, u32)>,
    fail_reads: bool,
    model_hidden_reads: u32,
}

/// Register file backed by a hash map, recording every write
#[derive(Clone, Default)]
pub struct FakeRegisters {
    state: Rc<RefCell<RegisterState>>,
}

impl FakeRegisters {
    pub fn new() -> FakeRegisters {
        FakeRegisters::default()
    }

    pub fn with_identity(model: u32, revision: u32, customer_id: u32) -> FakeRegisters {
        let regs = FakeRegisters::new();
        regs.poke(register::TOP_CHIP_MODEL, model);
        regs.poke(register::TOP_CHIP_REV, revision);
        regs.poke(register::TOP_CHIP_CUSTOMER_ID, customer_id);
        regs
    }

    /// the model register reads zero for the given number of reads
    pub fn hide_model_for(&self, reads: u32) {
        self.state.borrow_mut().model_hidden_reads = reads;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// set a register without logging a write
    pub fn poke(&self, reg: u32, value: u32) {
        self.state.borrow_mut().values.insert(reg, value);
    }

    pub fn peek(&self, reg: u32) -> u32 {
        self.state.borrow().values.get(&reg).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().writes.clear();
    }

    fn check(reg: u32) -> Result<(), interface::Error> {
        if reg % 4 != 0 {
            return Err(interface::Error::Unaligned(reg));
        }
        if reg > register::MAX_REGISTER {
            return Err(interface::Error::OutOfRange(reg));
        }
        Ok(())
    }
}

impl RegisterMap for FakeRegisters {
    fn read(&self, reg: u32) -> Result<u32, interface::Error> {
        FakeRegisters::check(reg)?;
        let mut state = self.state.borrow_mut();
        if state.fail_reads {
            return Err(interface::Error::OutOfRange(reg));
        }
        if reg == register::TOP_CHIP_MODEL && state.model_hidden_reads > 0 {
            state.model_hidden_reads -= 1;
            return Ok(0);
        }
        let value = state.values.get(&reg).copied().unwrap_or(0);
        if reg == register::TOP_IRQ_ACK {
            state.values.insert(reg, 0);
        }
        Ok(value)
    }

    fn write(&self, reg: u32, value: u32) -> Result<(), interface::Error> {
        FakeRegisters::check(reg)?;
        let mut state = self.state.borrow_mut();
        state.values.insert(reg, value);
        state.writes.push((reg, value));
        Ok(())
    }
}

struct ClockState {
    rate: u64,
    enabled: bool,
    rounding: Option<i64>,
    rejecting: bool,
}

/// Clock whose state stays observable after it was handed out
#[derive(Clone)]
pub struct FakeClock {
    name: &'static str,
    state: Rc<RefCell<ClockState>>,
    events: Events,
}

impl FakeClock {
    fn build(name: &'static str, rounding: Option<i64>, rejecting: bool, events: Events) -> FakeClock {
        FakeClock {
            name,
            state: Rc::new(RefCell::new(ClockState {
                rate: 0,
                enabled: false,
                rounding,
                rejecting,
            })),
            events,
        }
    }

    /// rounds every rate to itself
    pub fn new() -> FakeClock {
        FakeClock::build("clk", None, false, Events::default())
    }

    pub fn rounding_to(rate: i64) -> FakeClock {
        FakeClock::build("clk", Some(rate), false, Events::default())
    }

    /// fails enable and set_rate
    pub fn rejecting() -> FakeClock {
        FakeClock::build("clk", None, true, Events::default())
    }

    pub fn rate(&self) -> u64 {
        self.state.borrow().rate
    }

    pub fn enabled(&self) -> bool {
        self.state.borrow().enabled
    }
}

impl Clock for FakeClock {
    fn enable(&mut self) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.rejecting {
            return Err(Error::Clock);
        }
        state.enabled = true;
        self.events.borrow_mut().push(format!("{} on", self.name));
        Ok(())
    }

    fn disable(&mut self) {
        self.state.borrow_mut().enabled = false;
        self.events.borrow_mut().push(format!("{} off", self.name));
    }

    fn round_rate(&self, rate_hz: u64) -> i64 {
        self.state.borrow().rounding.unwrap_or(rate_hz as i64)
    }

    fn set_rate(&mut self, rate_hz: u64) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if state.rejecting {
            return Err(Error::Clock);
        }
        state.rate = rate_hz;
        Ok(())
    }
}

/// Reset group, starts asserted
#[derive(Clone)]
pub struct FakeResets {
    asserted: Rc<RefCell<bool>>,
    events: Events,
}

impl FakeResets {
    pub fn asserted(&self) -> bool {
        *self.asserted.borrow()
    }
}

impl ResetLines for FakeResets {
    fn assert(&mut self) -> Result<(), Error> {
        *self.asserted.borrow_mut() = true;
        self.events.borrow_mut().push("reset assert".into());
        Ok(())
    }

    fn deassert(&mut self) -> Result<(), Error> {
        *self.asserted.borrow_mut() = false;
        self.events.borrow_mut().push("reset deassert".into());
        Ok(())
    }
}

/// Display graph with a fixed set of ports, every endpoint has a pass through sink
pub struct FakeGraph {
    ports: Vec<(bool, bool)>,
    sinks_available: bool,
}

impl FakeGraph {
    /// one (parallel, serial) endpoint pair per port
    pub fn new(ports: &[(bool, bool)]) -> FakeGraph {
        FakeGraph {
            ports: ports.to_vec(),
            sinks_available: true,
        }
    }
}

impl DisplayGraph for FakeGraph {
    fn port_count(&self) -> usize {
        self.ports.len()
    }

    fn has_endpoint(&self, port: usize, kind: InterfaceKind) -> bool {
        match (self.ports.get(port), kind) {
            (Some((parallel, _)), InterfaceKind::Parallel) => *parallel,
            (Some((_, serial)), InterfaceKind::Serial) => *serial,
            (None, _) => false,
        }
    }

    fn downstream_sink(
        &mut self,
        port: usize,
        kind: InterfaceKind,
    ) -> Result<Box<dyn DownstreamSink>, Error> {
        if !self.sinks_available || !self.has_endpoint(port, kind) {
            return Err(Error::SinkUnavailable(port));
        }
        Ok(Box::new(PassThrough))
    }
}

/// Complete fake platform around a FakeGraph and FakeRegisters
pub struct FakePlatform {
    pub graph: FakeGraph,
    pub regs: FakeRegisters,
    pub resets: FakeResets,
    pub clocks: HashMap<&'static str, FakeClock>,
    pub events: Events,
    pub missing_clock: Option<&'static str>,
    pub rejecting_clock: Option<&'static str>,
}

impl FakePlatform {
    /// platform of a controller with the given identity registers and ports
    pub fn new(regs: FakeRegisters, ports: &[(bool, bool)]) -> FakePlatform {
        let events = Events::default();
        FakePlatform {
            graph: FakeGraph::new(ports),
            regs,
            resets: FakeResets {
                asserted: Rc::new(RefCell::new(true)),
                events: events.clone(),
            },
            clocks: HashMap::new(),
            events,
            missing_clock: None,
            rejecting_clock: None,
        }
    }

    /// platform of a 0x8200 rev 0x5720 controller
    pub fn dc8200(ports: &[(bool, bool)]) -> FakePlatform {
        FakePlatform::new(FakeRegisters::with_identity(0x8200, 0x5720, 0x310), ports)
    }

    pub fn without_sinks(mut self) -> FakePlatform {
        self.graph.sinks_available = false;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn clock_handle(&self, name: &str) -> FakeClock {
        self.clocks[name].clone()
    }
}

impl DisplayGraph for FakePlatform {
    fn port_count(&self) -> usize {
        self.graph.port_count()
    }

    fn has_endpoint(&self, port: usize, kind: InterfaceKind) -> bool {
        self.graph.has_endpoint(port, kind)
    }

    fn downstream_sink(
        &mut self,
        port: usize,
        kind: InterfaceKind,
    ) -> Result<Box<dyn DownstreamSink>, Error> {
        self.graph.downstream_sink(port, kind)
    }
}

impl Platform for FakePlatform {
    type Registers = FakeRegisters;
    type Clock = FakeClock;
    type Resets = FakeResets;

    fn resets(&mut self, names: &[&'static str]) -> Result<FakeResets, Error> {
        assert_eq!(names, &["core", "axi", "ahb"]);
        Ok(self.resets.clone())
    }

    fn clock(&mut self, name: &'static str) -> Result<FakeClock, Error> {
        if self.missing_clock == Some(name) {
            return Err(Error::MissingResource(name));
        }
        let clock = FakeClock::build(
            name,
            None,
            self.rejecting_clock == Some(name),
            self.events.clone(),
        );
        self.clocks.insert(name, clock.clone());
        Ok(clock)
    }

    fn irq(&mut self) -> Result<u32, Error> {
        Ok(42)
    }

    fn map_registers(&mut self) -> Result<FakeRegisters, Error> {
        self.events.borrow_mut().push("map".into());
        Ok(self.regs.clone())
    }
}
