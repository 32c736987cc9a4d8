#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

//! Driver core for the Verisilicon DC-series display controllers (DC8200)
//! The controller scans out one primary plane per output and feeds it to a parallel (DPI)
//! or serial (DP) panel interface. Platform services like clocks, resets and the display
//! graph are provided by the user through the traits in [`platform`].

#[macro_use]
extern crate alloc;
use alloc::vec::Vec;

pub mod bridge;
pub mod crtc;
pub mod format;
pub mod hwdb;
pub mod interface;
pub mod irq;
#[cfg(test)]
mod mock;
pub mod plane;
pub mod platform;
mod register;

use crate::bridge::{BusConfig, BusFlags, BusFormat, Negotiator};
use crate::crtc::{DisplayMode, EventDelivery, OutputPipeline, PipelineState};
use crate::format::Fourcc;
use crate::hwdb::ChipIdentity;
use crate::interface::RegisterMap;
use crate::irq::IrqReport;
use crate::plane::{PlaneState, PrimaryPlane};
use crate::platform::{Clock, Platform, ResetLines};
use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

/// Maximum number of outputs the driver handles
pub const MAX_OUTPUTS: usize = 2;

const RESET_NAMES: [&str; 3] = ["core", "axi", "ahb"];
const SHARED_CLOCKS: [&str; 3] = ["core", "axi", "ahb"];
const PIX_CLOCKS: [&str; MAX_OUTPUTS] = ["pix0", "pix1"];

/// Controller Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// register interface error
    Interface(interface::Error),
    /// the identity registers match no known controller
    UnknownDevice {
        /// chip model register
        model: u32,
        /// chip revision register
        revision: u32,
        /// customer id register
        customer_id: u32,
    },
    /// the display graph has no output ports
    NoOutputs,
    /// the display graph has more output ports than the controller can drive
    TooManyOutputs {
        /// ports in the display graph
        ports: usize,
        /// outputs supported
        supported: usize,
    },
    /// a named platform resource (clock, reset, irq, registers) is unavailable
    MissingResource(&'static str),
    /// the downstream sink of an output cannot be resolved
    SinkUnavailable(usize),
    /// an output has both a parallel and a serial endpoint
    AmbiguousInterface(usize),
    /// the output index does not exist
    InvalidOutput(usize),
    /// nothing is connected to the output
    OutputNotConnected(usize),
    /// the bus format cannot be encoded by the output
    UnsupportedFormat(BusFormat),
    /// the output was enabled before a bus format was negotiated
    NotNegotiated(usize),
    /// a timing total does not fit the 15bit timing fields
    TimingOverflow,
    /// the active area exceeds the configured limits
    ModeTooLarge,
    /// the pixel clock cannot reach the mode clock
    ClockOutOfRange,
    /// a clock operation failed
    Clock,
    /// a reset operation failed
    Reset,
    /// the plane source and destination sizes differ
    ScalingUnsupported,
    /// a visible plane does not cover the whole output
    PlaneNotFullscreen,
    /// the buffer format cannot be scanned out
    UnsupportedPixelFormat(Fourcc),
}
impl From<interface::Error> for Error {
    fn from(e: interface::Error) -> Self {
        Error::Interface(e)
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// widest accepted active area in pixels
    pub max_width: u32,
    /// highest accepted active area in lines
    pub max_height: u32,
    /// line pitch alignment of dumb buffers in bytes
    pub pitch_align: u32,
    /// interval between identity polls after reset release
    pub reset_poll_interval_us: u32,
    /// identity polls before giving up
    pub reset_poll_attempts: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_width: 8192,
            max_height: 8192,
            pitch_align: 128,
            reset_poll_interval_us: 10,
            reset_poll_attempts: 100,
        }
    }
}

struct Output<C> {
    pipeline: OutputPipeline<C>,
    negotiator: Option<Negotiator>,
    plane: PrimaryPlane,
}

/// Verisilicon DC display controller driver
/// Mode affecting operations need exclusive access, interrupts are handled through a shared
/// reference
pub struct Controller<P: Platform> {
    regs: P::Registers,
    resets: P::Resets,
    clocks: Vec<P::Clock>,
    irq: u32,
    identity: ChipIdentity,
    config: ControllerConfig,
    outputs: Vec<Output<P::Clock>>,
}

impl<P: Platform> Controller<P> {
    /// Acquires the platform resources, releases the controller from reset and sets up
    /// every output of the display graph
    /// On failure the shared clocks are disabled and the resets asserted again
    pub fn probe<D: DelayNs>(
        platform: &mut P,
        delay: &mut D,
        config: ControllerConfig,
    ) -> Result<Controller<P>, Error> {
        let ports = platform.port_count();
        if ports == 0 {
            error!("No output ports");
            return Err(Error::NoOutputs);
        }
        if ports > MAX_OUTPUTS {
            error!("{} output ports, at most {} supported", ports, MAX_OUTPUTS);
            return Err(Error::TooManyOutputs {
                ports,
                supported: MAX_OUTPUTS,
            });
        }

        let mut resets = platform.resets(&RESET_NAMES)?;
        let mut clocks = Vec::with_capacity(SHARED_CLOCKS.len());

        match Self::bring_up(platform, delay, &config, ports, &mut resets, &mut clocks) {
            Ok((regs, irq, identity, outputs)) => Ok(Controller {
                regs,
                resets,
                clocks,
                irq,
                identity,
                config,
                outputs,
            }),
            Err(e) => {
                error!("Probe failed: {:?}", e);
                release_shared(&mut clocks, &mut resets);
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn bring_up<D: DelayNs>(
        platform: &mut P,
        delay: &mut D,
        config: &ControllerConfig,
        ports: usize,
        resets: &mut P::Resets,
        clocks: &mut Vec<P::Clock>,
    ) -> Result<(P::Registers, u32, ChipIdentity, Vec<Output<P::Clock>>), Error> {
        for name in SHARED_CLOCKS {
            let mut clock = platform.clock(name)?;
            clock.enable()?;
            clocks.push(clock);
        }

        let mut pix_clocks = Vec::with_capacity(ports);
        for name in PIX_CLOCKS.iter().take(ports) {
            pix_clocks.push(platform.clock(*name)?);
        }

        let irq = platform.irq()?;

        resets.deassert()?;
        let regs = platform.map_registers()?;

        // the identity registers read zero until the controller left reset
        regs.poll(
            register::TOP_CHIP_MODEL,
            delay,
            config.reset_poll_interval_us,
            config.reset_poll_attempts,
            |model| model != 0,
        )?;

        let identity = hwdb::fill_chip_identity(&regs)?;
        info!(
            "DC{:x} rev {:x} customer {:x}",
            identity.model, identity.revision, identity.customer_id
        );

        if ports > identity.display_count {
            error!(
                "{} output ports, DC{:x} drives {}",
                ports, identity.model, identity.display_count
            );
            return Err(Error::TooManyOutputs {
                ports,
                supported: identity.display_count,
            });
        }

        let mut outputs = Vec::with_capacity(ports);
        for (index, pix_clk) in pix_clocks.into_iter().enumerate() {
            let negotiator = Negotiator::detect(platform, index)?;
            outputs.push(Output {
                pipeline: OutputPipeline::new(index, pix_clk),
                negotiator,
                plane: PrimaryPlane::new(index, identity.formats),
            });
        }

        Ok((regs, irq, identity, outputs))
    }

    /// Identity and capabilities of the probed controller
    pub fn identity(&self) -> &ChipIdentity {
        &self.identity
    }

    /// Interrupt line the user has to route to [`Controller::handle_irq`]
    pub fn irq_line(&self) -> u32 {
        self.irq
    }

    /// Number of outputs set up at probe time
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Checks if a downstream endpoint is connected to the output
    pub fn is_connected(&self, output: usize) -> Result<bool, Error> {
        Ok(self.output(output)?.negotiator.is_some())
    }

    /// Buffer formats the primary plane of the output can scan out
    pub fn plane_formats(&self, output: usize) -> Result<&'static [Fourcc], Error> {
        Ok(self.output(output)?.plane.formats())
    }

    /// Candidate bus formats of the output in order of preference
    pub fn output_formats(&self, output: usize) -> Result<Vec<BusFormat>, Error> {
        Ok(self.negotiator(output)?.output_formats())
    }

    /// Bus formats the downstream sink accepts for an output format
    pub fn input_formats(&self, output: usize, format: BusFormat) -> Result<Vec<BusFormat>, Error> {
        Ok(self.negotiator(output)?.input_formats(format))
    }

    /// Accepts the final bus configuration of the output
    pub fn check_bus(&mut self, output: usize, bus: BusConfig) -> Result<(), Error> {
        self.negotiator_mut(output)?.check(bus)
    }

    /// Picks and accepts the preferred bus format the sink supports
    pub fn negotiate(&mut self, output: usize, flags: BusFlags) -> Result<BusFormat, Error> {
        self.negotiator_mut(output)?.negotiate(flags)
    }

    /// Checks a mode against the output and fills in the achievable clock
    pub fn validate_mode(&self, output: usize, mode: &mut DisplayMode) -> Result<(), Error> {
        self.output(output)?
            .pipeline
            .validate_mode(mode, &self.config)
    }

    /// Programs a validated mode
    pub fn mode_set(&mut self, output: usize, mode: &DisplayMode) -> Result<(), Error> {
        let regs = &self.regs;
        let out = self
            .outputs
            .get_mut(output)
            .ok_or(Error::InvalidOutput(output))?;
        out.pipeline.mode_set(regs, mode)
    }

    /// Validates the primary plane state for the mode the output will run
    pub fn check_plane(
        &self,
        output: usize,
        state: &mut PlaneState,
        mode: Option<&DisplayMode>,
    ) -> Result<(), Error> {
        self.output(output)?.plane.check(state, mode)
    }

    /// Programs the primary plane
    pub fn update_plane(&mut self, output: usize, state: &PlaneState) -> Result<(), Error> {
        let out = self.output(output)?;
        out.plane.update(&self.regs, state)
    }

    /// Starts the output pipeline, then the panel interface
    pub fn enable_output(&mut self, output: usize) -> Result<(), Error> {
        let regs = &self.regs;
        let out = self
            .outputs
            .get_mut(output)
            .ok_or(Error::InvalidOutput(output))?;
        let negotiator = out
            .negotiator
            .as_ref()
            .ok_or(Error::OutputNotConnected(output))?;
        if negotiator.negotiated().is_none() {
            error!("Output {} enabled without a bus format", output);
            return Err(Error::NotNegotiated(output));
        }

        out.pipeline.enable(regs)?;
        negotiator.enable(regs)
    }

    /// Stops the panel interface, then the output pipeline
    pub fn disable_output(&mut self, output: usize) -> Result<(), Error> {
        let regs = &self.regs;
        let out = self
            .outputs
            .get_mut(output)
            .ok_or(Error::InvalidOutput(output))?;
        if let Some(negotiator) = &out.negotiator {
            negotiator.disable(regs)?;
        }
        out.pipeline.disable(regs)
    }

    /// State of the output pipeline
    pub fn output_state(&self, output: usize) -> Result<PipelineState, Error> {
        Ok(self.output(output)?.pipeline.state())
    }

    /// Hands the frame completion notification of a commit to the output
    pub fn flush(&self, output: usize, event_pending: bool) -> Result<Option<EventDelivery>, Error> {
        Ok(self.output(output)?.pipeline.flush(event_pending))
    }

    /// Interrupt handler, never blocks or allocates
    pub fn handle_irq(&self) -> IrqReport {
        irq::dispatch(&self.regs, self.outputs.len(), |index| {
            self.outputs.get(index).map(|out| &out.pipeline)
        })
    }

    /// Returns and resets the number of delivered frame completion notifications
    pub fn take_completed(&self, output: usize) -> Result<u32, Error> {
        Ok(self.output(output)?.pipeline.take_completed())
    }

    /// Number of vblanks of the output
    pub fn vblank_count(&self, output: usize) -> Result<u32, Error> {
        Ok(self.output(output)?.pipeline.vblank_count())
    }

    /// Line pitch of a dumb buffer, None if it does not fit 32 bits
    pub fn dumb_pitch(&self, width: u32, bits_per_pixel: u32) -> Option<u32> {
        dumb_pitch(width, bits_per_pixel, self.config.pitch_align)
    }

    /// Disables every enabled output
    pub fn shutdown(&mut self) -> Result<(), Error> {
        debug!("Shutting down");
        for index in 0..self.outputs.len() {
            if self.outputs[index].pipeline.state() == PipelineState::Enabled {
                self.disable_output(index)?;
            }
        }
        Ok(())
    }

    /// Shuts down, gates the shared clocks and puts the controller into reset
    pub fn finalize(mut self) -> Result<(), Error> {
        self.shutdown()?;
        release_shared(&mut self.clocks, &mut self.resets);
        Ok(())
    }

    fn output(&self, output: usize) -> Result<&Output<P::Clock>, Error> {
        self.outputs.get(output).ok_or(Error::InvalidOutput(output))
    }

    fn negotiator(&self, output: usize) -> Result<&Negotiator, Error> {
        self.output(output)?
            .negotiator
            .as_ref()
            .ok_or(Error::OutputNotConnected(output))
    }

    fn negotiator_mut(&mut self, output: usize) -> Result<&mut Negotiator, Error> {
        self.outputs
            .get_mut(output)
            .ok_or(Error::InvalidOutput(output))?
            .negotiator
            .as_mut()
            .ok_or(Error::OutputNotConnected(output))
    }
}

fn release_shared<C: Clock, R: ResetLines>(clocks: &mut Vec<C>, resets: &mut R) {
    while let Some(mut clock) = clocks.pop() {
        clock.disable();
    }
    if let Err(e) = resets.assert() {
        error!("Cannot assert resets: {:?}", e);
    }
}

/// Line pitch in bytes of a buffer, rounded up to the alignment
/// Returns None for a zero alignment or a pitch beyond 32 bits
pub fn dumb_pitch(width: u32, bits_per_pixel: u32, align: u32) -> Option<u32> {
    let pitch = (width as u64 * bits_per_pixel as u64).div_ceil(8);
    let aligned = pitch.checked_next_multiple_of(align as u64)?;
    u32::try_from(aligned).ok()
}
