//! Decodes the shared interrupt status of the controller

use crate::crtc::OutputPipeline;
use crate::interface::RegisterMap;
use crate::platform::Clock;
use crate::register;
use log::{error, warn};

/// Outcome of one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqReport {
    /// status bits of the outputs whose vblank was signaled
    pub serviced: u32,
    /// status bits no output claimed
    pub unrecognized: u32,
}

/// Acknowledges the pending interrupts and signals the vblank of every affected output
///
/// `output_count` is the number of outputs set up at probe time, `pipeline` resolves an
/// output index to its pipeline if one was created. The interrupt is always handled, a failed
/// status read yields an empty report.
pub fn dispatch<'a, R, C, F>(regs: &R, output_count: usize, pipeline: F) -> IrqReport
where
    R: RegisterMap,
    C: Clock + 'a,
    F: Fn(usize) -> Option<&'a OutputPipeline<C>>,
{
    // reading acknowledges
    let mut status = match regs.read(register::TOP_IRQ_ACK) {
        Ok(status) => status,
        Err(e) => {
            error!("Cannot read interrupt status: {:?}", e);
            return IrqReport::default();
        }
    };

    let mut report = IrqReport::default();
    for output in 0..output_count {
        let bit = register::top_irq_vsync(output);
        if status & bit == 0 {
            continue;
        }
        status &= !bit;

        if let Some(pipeline) = pipeline(output) {
            pipeline.handle_vblank();
            report.serviced |= bit;
        }
    }

    if status != 0 {
        warn!("Unknown interrupt status {:#010x}", status);
        report.unrecognized = status;
    }

    report
}
