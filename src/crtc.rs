//! Per output timing generator and vblank signaling

use crate::interface::RegisterMap;
use crate::platform::Clock;
use crate::register;
use crate::{ControllerConfig, Error};
use bitflags::bitflags;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use embedded_graphics_core::geometry::{Point, Size};
use embedded_graphics_core::primitives::Rectangle;
use log::debug;

bitflags! {
    /// Sync polarity flags of a display mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u32 {
        /// positive horizontal sync
        const PHSYNC = 1 << 0;
        /// negative horizontal sync
        const NHSYNC = 1 << 1;
        /// positive vertical sync
        const PVSYNC = 1 << 2;
        /// negative vertical sync
        const NVSYNC = 1 << 3;
    }
}

/// Display timings of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    /// requested pixel clock in kHz
    pub clock: u32,
    /// active pixels per line
    pub hdisplay: u32,
    /// first pixel of the horizontal sync pulse
    pub hsync_start: u32,
    /// first pixel after the horizontal sync pulse
    pub hsync_end: u32,
    /// pixels per line including blanking
    pub htotal: u32,
    /// active lines
    pub vdisplay: u32,
    /// first line of the vertical sync pulse
    pub vsync_start: u32,
    /// first line after the vertical sync pulse
    pub vsync_end: u32,
    /// lines per frame including blanking
    pub vtotal: u32,
    /// sync polarities
    pub flags: ModeFlags,
    /// pixel clock in kHz the hardware actually runs at, filled by validation
    pub crtc_clock: u32,
}

impl DisplayMode {
    /// The visible area of the mode
    pub fn active_area(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.hdisplay, self.vdisplay))
    }
}

/// Enable state of an output pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// pixel clock off, no vblank signaling
    Disabled,
    /// pixel clock running, vblank signaling on
    Enabled,
}

/// How a frame completion notification was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDelivery {
    /// delivered on the next vblank interrupt
    Armed,
    /// delivered right away, vblank signaling was off
    Immediate,
}

/// Vblank bookkeeping shared with the interrupt handler
#[derive(Debug, Default)]
struct VblankState {
    enabled: AtomicBool,
    // events waiting for the next vblank
    pending: AtomicU32,
    count: AtomicU32,
    completed: AtomicU32,
}

/// Timing and enable state machine of one output
pub struct OutputPipeline<C> {
    index: usize,
    pix_clk: C,
    state: PipelineState,
    vblank: VblankState,
}

impl<C: Clock> OutputPipeline<C> {
    /// Creates a disabled pipeline driving the given pixel clock
    pub fn new(index: usize, pix_clk: C) -> OutputPipeline<C> {
        OutputPipeline {
            index,
            pix_clk,
            state: PipelineState::Disabled,
            vblank: VblankState::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Checks the mode against the hardware limits and fills in the achievable pixel clock
    /// The hardware is not touched
    pub fn validate_mode(&self, mode: &mut DisplayMode, config: &ControllerConfig) -> Result<(), Error> {
        if mode.htotal > register::DISP_SIZE_FIELD_MASK || mode.vtotal > register::DISP_SIZE_FIELD_MASK {
            return Err(Error::TimingOverflow);
        }
        if mode.hdisplay > config.max_width || mode.vdisplay > config.max_height {
            return Err(Error::ModeTooLarge);
        }

        let rate = self.pix_clk.round_rate(mode.clock as u64 * 1000);
        if rate <= 0 {
            return Err(Error::ClockOutOfRange);
        }

        mode.crtc_clock = (rate / 1000) as u32;
        Ok(())
    }

    /// Programs the pixel clock and the timing registers
    pub fn mode_set<R: RegisterMap>(&mut self, regs: &R, mode: &DisplayMode) -> Result<(), Error> {
        let output = self.index;

        debug!("Setting mode on output {}", output);

        self.pix_clk.set_rate(mode.crtc_clock as u64 * 1000)?;

        regs.write(
            register::disp_hsize(output),
            mode.hdisplay | mode.htotal << register::DISP_SIZE_TOTAL_SHIFT,
        )?;
        regs.write(
            register::disp_vsize(output),
            mode.vdisplay | mode.vtotal << register::DISP_SIZE_TOTAL_SHIFT,
        )?;

        let mut hsync = mode.hsync_start
            | mode.hsync_end << register::DISP_SYNC_END_SHIFT
            | register::DISP_SYNC_EN;
        if !mode.flags.contains(ModeFlags::PHSYNC) {
            hsync |= register::DISP_SYNC_POL;
        }
        regs.write(register::disp_hsync(output), hsync)?;

        let mut vsync = mode.vsync_start
            | mode.vsync_end << register::DISP_SYNC_END_SHIFT
            | register::DISP_SYNC_EN;
        if !mode.flags.contains(ModeFlags::PVSYNC) {
            vsync |= register::DISP_SYNC_POL;
        }
        regs.write(register::disp_vsync(output), vsync)?;

        Ok(())
    }

    /// Starts the pixel clock, then vblank signaling
    pub fn enable<R: RegisterMap>(&mut self, regs: &R) -> Result<(), Error> {
        if self.state == PipelineState::Enabled {
            return Ok(());
        }

        debug!("Enabling pipeline {}", self.index);

        self.pix_clk.enable()?;
        self.enable_vblank(regs)?;
        self.state = PipelineState::Enabled;
        Ok(())
    }

    /// Stops vblank signaling, then the pixel clock
    pub fn disable<R: RegisterMap>(&mut self, regs: &R) -> Result<(), Error> {
        if self.state == PipelineState::Disabled {
            return Ok(());
        }

        debug!("Disabling pipeline {}", self.index);

        self.disable_vblank(regs)?;
        self.pix_clk.disable();
        self.state = PipelineState::Disabled;
        Ok(())
    }

    fn enable_vblank<R: RegisterMap>(&self, regs: &R) -> Result<(), Error> {
        debug!("Enabling vblank on output {}", self.index);
        regs.set_bits(register::TOP_IRQ_EN, register::top_irq_vsync(self.index))?;
        self.vblank.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn disable_vblank<R: RegisterMap>(&self, regs: &R) -> Result<(), Error> {
        debug!("Disabling vblank on output {}", self.index);
        self.vblank.enabled.store(false, Ordering::Release);
        regs.clear_bits(register::TOP_IRQ_EN, register::top_irq_vsync(self.index))?;
        // no vblank will come to deliver armed events
        self.deliver_pending();
        Ok(())
    }

    /// Hands over the frame completion notification of the latest commit
    pub fn flush(&self, event_pending: bool) -> Option<EventDelivery> {
        if !event_pending {
            return None;
        }

        debug!("Flushing output {} vblank events", self.index);

        if self.vblank.enabled.load(Ordering::Acquire) {
            self.vblank.pending.fetch_add(1, Ordering::AcqRel);
            Some(EventDelivery::Armed)
        } else {
            self.vblank.completed.fetch_add(1, Ordering::AcqRel);
            Some(EventDelivery::Immediate)
        }
    }

    /// Called from interrupt context on every vblank of this output
    pub fn handle_vblank(&self) {
        self.vblank.count.fetch_add(1, Ordering::AcqRel);
        self.deliver_pending();
    }

    fn deliver_pending(&self) {
        let pending = self.vblank.pending.swap(0, Ordering::AcqRel);
        if pending != 0 {
            self.vblank.completed.fetch_add(pending, Ordering::AcqRel);
        }
    }

    /// Number of vblanks seen since creation
    pub fn vblank_count(&self) -> u32 {
        self.vblank.count.load(Ordering::Acquire)
    }

    /// Returns and resets the number of delivered frame completion notifications
    pub fn take_completed(&self) -> u32 {
        self.vblank.completed.swap(0, Ordering::AcqRel)
    }

    /// Consumes the pipeline and returns its pixel clock
    pub fn release(self) -> C {
        self.pix_clk
    }
}
