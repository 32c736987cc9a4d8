//! Output interface detection and bus format negotiation with the downstream sink

use crate::interface::RegisterMap;
use crate::platform::DisplayGraph;
use crate::register;
use crate::Error;
use alloc::boxed::Box;
use alloc::vec::Vec;
use bitflags::bitflags;
use log::{debug, error, info};

/// Pixel encoding on the bus between an output and its downstream sink (media bus codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFormat(pub u32);

#[allow(missing_docs)]
impl BusFormat {
    /// no preference, the sink takes what it gets
    pub const FIXED: BusFormat = BusFormat(0x0001);
    pub const RGB666_1X18: BusFormat = BusFormat(0x1009);
    pub const RGB888_1X24: BusFormat = BusFormat(0x100a);
    pub const RGB565_1X16: BusFormat = BusFormat(0x1017);
    pub const RGB101010_1X30: BusFormat = BusFormat(0x1018);
    pub const UYVY8_1X16: BusFormat = BusFormat(0x200f);
    pub const YUV10_1X30: BusFormat = BusFormat(0x2016);
    pub const UYVY10_1X20: BusFormat = BusFormat(0x201a);
    pub const YUV8_1X24: BusFormat = BusFormat(0x2025);
    pub const UYYVYY8_0_5X24: BusFormat = BusFormat(0x2026);
    pub const UYYVYY10_0_5X30: BusFormat = BusFormat(0x2027);
}

bitflags! {
    /// Signal properties of the bus, requested by the downstream sink
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BusFlags: u32 {
        /// data enable is active low
        const DE_LOW = 1 << 0;
        /// data enable is active high
        const DE_HIGH = 1 << 1;
        /// data is driven on the rising clock edge
        const PIXDATA_DRIVE_POSEDGE = 1 << 2;
        /// data is driven on the falling clock edge
        const PIXDATA_DRIVE_NEGEDGE = 1 << 3;
    }
}

/// Bus configuration selected for an output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// pixel encoding
    pub format: BusFormat,
    /// signal properties
    pub flags: BusFlags,
}

/// Physical interface of an output, the value is the endpoint id in the display graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// synchronous parallel pixel bus (DPI)
    Parallel = 0,
    /// packetized serial link (DP)
    Serial = 1,
}

/// The next element of the display pipeline behind an output
pub trait DownstreamSink {
    /// input formats the sink could consume when the output drives output_format
    fn propagate(&self, output_format: BusFormat) -> Vec<BusFormat>;
}

/// Sink which accepts whatever format it is given
pub struct PassThrough;

impl DownstreamSink for PassThrough {
    fn propagate(&self, output_format: BusFormat) -> Vec<BusFormat> {
        vec![output_format]
    }
}

/// Entry of the serial interface format table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialFormat {
    /// format on the wire
    pub wire: BusFormat,
    /// the panel has to be switched to YUV mode
    pub is_yuv: bool,
    /// encoding for the serial config register
    pub hw: u32,
}

const fn serial(wire: BusFormat, is_yuv: bool, hw: u32) -> SerialFormat {
    SerialFormat { wire, is_yuv, hw }
}

/// Formats of the serial interface in order of preference, the first entry is the default
pub static SERIAL_FORMATS: [SerialFormat; 11] = [
    serial(BusFormat::FIXED, false, register::DP_CONFIG_FMT_RGB888),
    serial(BusFormat::RGB888_1X24, false, register::DP_CONFIG_FMT_RGB888),
    serial(BusFormat::RGB565_1X16, false, register::DP_CONFIG_FMT_RGB565),
    serial(BusFormat::RGB666_1X18, false, register::DP_CONFIG_FMT_RGB666),
    serial(BusFormat::RGB101010_1X30, false, register::DP_CONFIG_FMT_RGB101010),
    serial(BusFormat::UYVY8_1X16, true, register::DP_CONFIG_YUV_FMT_UYVY8),
    serial(BusFormat::UYVY10_1X20, true, register::DP_CONFIG_YUV_FMT_UYVY10),
    serial(BusFormat::YUV8_1X24, true, register::DP_CONFIG_YUV_FMT_YUV8),
    serial(BusFormat::YUV10_1X30, true, register::DP_CONFIG_YUV_FMT_YUV10),
    serial(BusFormat::UYYVYY8_0_5X24, true, register::DP_CONFIG_YUV_FMT_UYYVYY8),
    serial(BusFormat::UYYVYY10_0_5X30, true, register::DP_CONFIG_YUV_FMT_UYYVYY10),
];

fn serial_format(format: BusFormat) -> Option<&'static SerialFormat> {
    SERIAL_FORMATS.iter().find(|entry| entry.wire == format)
}

/// Negotiates the bus format of one output and sequences its panel interface
pub struct Negotiator {
    output: usize,
    kind: InterfaceKind,
    sink: Box<dyn DownstreamSink>,
    bus: Option<BusConfig>,
}

impl Negotiator {
    /// Creates a negotiator for a known interface kind and sink
    pub fn new(output: usize, kind: InterfaceKind, sink: Box<dyn DownstreamSink>) -> Negotiator {
        Negotiator {
            output,
            kind,
            sink,
            bus: None,
        }
    }

    /// Probes the display graph for the interface kind of the output and attaches its sink
    /// Returns None if nothing is connected to the output
    pub fn detect<G: DisplayGraph + ?Sized>(
        graph: &mut G,
        output: usize,
    ) -> Result<Option<Negotiator>, Error> {
        let parallel = graph.has_endpoint(output, InterfaceKind::Parallel);
        let serial = graph.has_endpoint(output, InterfaceKind::Serial);

        let kind = match (parallel, serial) {
            (true, false) => InterfaceKind::Parallel,
            (false, true) => InterfaceKind::Serial,
            (true, true) => {
                error!("Output {} has both a parallel and a serial endpoint", output);
                return Err(Error::AmbiguousInterface(output));
            }
            (false, false) => {
                info!("Skipping output {}", output);
                return Ok(None);
            }
        };

        let sink = graph.downstream_sink(output, kind).map_err(|e| {
            error!("Cannot get downstream sink of output {}: {:?}", output, e);
            e
        })?;

        Ok(Some(Negotiator::new(output, kind, sink)))
    }

    /// Interface kind, fixed for the lifetime of the output
    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    /// The bus configuration accepted by the last successful check
    pub fn negotiated(&self) -> Option<BusConfig> {
        self.bus
    }

    /// Candidate output formats in order of preference
    pub fn output_formats(&self) -> Vec<BusFormat> {
        match self.kind {
            InterfaceKind::Parallel => vec![BusFormat::RGB888_1X24, BusFormat::FIXED],
            InterfaceKind::Serial => SERIAL_FORMATS.iter().map(|entry| entry.wire).collect(),
        }
    }

    /// Candidate input formats of the sink for a chosen output format
    /// An empty list rejects the output format
    pub fn input_formats(&self, output_format: BusFormat) -> Vec<BusFormat> {
        if self.kind == InterfaceKind::Serial && serial_format(output_format).is_none() {
            return Vec::new();
        }
        self.sink.propagate(output_format)
    }

    /// Accepts the final bus configuration of a commit
    pub fn check(&mut self, bus: BusConfig) -> Result<(), Error> {
        if self.kind == InterfaceKind::Serial && serial_format(bus.format).is_none() {
            return Err(Error::UnsupportedFormat(bus.format));
        }
        self.bus = Some(bus);
        Ok(())
    }

    /// Selects the first output format the sink can consume and checks it
    pub fn negotiate(&mut self, flags: BusFlags) -> Result<BusFormat, Error> {
        let format = self
            .output_formats()
            .into_iter()
            .find(|format| !self.input_formats(*format).is_empty())
            .ok_or(Error::UnsupportedFormat(BusFormat::FIXED))?;

        self.check(BusConfig { format, flags })?;
        debug!("Output {} negotiated bus format {:#06x}", self.output, format.0);
        Ok(format)
    }

    /// Switches the panel interface on
    /// Nothing is written if no bus configuration was negotiated
    pub fn enable<R: RegisterMap>(&self, regs: &R) -> Result<(), Error> {
        let output = self.output;
        let bus = self.bus.ok_or(Error::NotNegotiated(output))?;
        let serial = match self.kind {
            InterfaceKind::Parallel => None,
            InterfaceKind::Serial => Some(serial_format(bus.format).ok_or_else(|| {
                error!("Output {} has no encoding for {:#06x}", output, bus.format.0);
                Error::NotNegotiated(output)
            })?),
        };

        debug!("Enabling output {}", output);

        let panel = register::disp_panel_config(output);
        match serial {
            None => {
                regs.clear_bits(register::disp_dp_config(output), register::DP_CONFIG_DP_EN)?;
                regs.write(
                    register::disp_dpi_config(output),
                    register::DPI_CONFIG_FMT_RGB888,
                )?;
            }
            Some(entry) => {
                regs.write(
                    register::disp_dp_config(output),
                    entry.hw | register::DP_CONFIG_DP_EN,
                )?;
                regs.assign_bits(panel, register::PANEL_CONFIG_YUV, entry.is_yuv)?;
            }
        }

        regs.clear_bits(panel, register::PANEL_CONFIG_DAT_POL)?;
        regs.assign_bits(
            panel,
            register::PANEL_CONFIG_DE_POL,
            bus.flags.contains(BusFlags::DE_LOW),
        )?;
        regs.assign_bits(
            panel,
            register::PANEL_CONFIG_CLK_POL,
            bus.flags.contains(BusFlags::PIXDATA_DRIVE_NEGEDGE),
        )?;
        regs.set_bits(
            panel,
            register::PANEL_CONFIG_DE_EN | register::PANEL_CONFIG_DAT_EN | register::PANEL_CONFIG_CLK_EN,
        )?;
        regs.set_bits(panel, register::PANEL_CONFIG_RUNNING)?;

        regs.clear_bits(
            register::DISP_PANEL_START,
            register::PANEL_START_MULTI_DISP_SYNC,
        )?;
        regs.set_bits(
            register::DISP_PANEL_START,
            register::panel_start_running(output),
        )?;

        regs.set_bits(
            register::disp_panel_config_ex(output),
            register::PANEL_CONFIG_EX_COMMIT,
        )?;
        Ok(())
    }

    /// Switches the panel interface off
    pub fn disable<R: RegisterMap>(&self, regs: &R) -> Result<(), Error> {
        let output = self.output;

        debug!("Disabling output {}", output);

        regs.clear_bits(
            register::DISP_PANEL_START,
            register::PANEL_START_MULTI_DISP_SYNC | register::panel_start_running(output),
        )?;
        regs.clear_bits(
            register::disp_panel_config(output),
            register::PANEL_CONFIG_RUNNING,
        )?;

        regs.set_bits(
            register::disp_panel_config_ex(output),
            register::PANEL_CONFIG_EX_COMMIT,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeGraph, FakeRegisters};
    use crate::register::*;

    struct OnlyRgb;

    impl DownstreamSink for OnlyRgb {
        fn propagate(&self, output_format: BusFormat) -> Vec<BusFormat> {
            if output_format == BusFormat::RGB565_1X16 {
                vec![output_format]
            } else {
                Vec::new()
            }
        }
    }

    fn negotiator(output: usize, kind: InterfaceKind) -> Negotiator {
        Negotiator::new(output, kind, Box::new(PassThrough))
    }

    fn rgb888() -> BusConfig {
        BusConfig {
            format: BusFormat::RGB888_1X24,
            flags: BusFlags::empty(),
        }
    }

    #[test]
    fn parallel_offers_fixed_format_and_sentinel() {
        let n = negotiator(0, InterfaceKind::Parallel);
        assert_eq!(
            n.output_formats(),
            vec![BusFormat::RGB888_1X24, BusFormat::FIXED]
        );
        // pass through, even for formats a serial link would reject
        assert_eq!(
            n.input_formats(BusFormat(0x3001)),
            vec![BusFormat(0x3001)]
        );
    }

    #[test]
    fn serial_offers_full_table_in_order() {
        let n = negotiator(0, InterfaceKind::Serial);
        let formats = n.output_formats();
        assert_eq!(formats.len(), SERIAL_FORMATS.len());
        assert_eq!(formats[0], BusFormat::FIXED);
        assert_eq!(formats[1], BusFormat::RGB888_1X24);
        assert_eq!(formats[10], BusFormat::UYYVYY10_0_5X30);
    }

    #[test]
    fn serial_rejects_unknown_format() {
        let mut n = negotiator(0, InterfaceKind::Serial);
        let unknown = BusFormat(0x3001);

        assert!(n.input_formats(unknown).is_empty());
        assert_eq!(
            n.check(BusConfig {
                format: unknown,
                flags: BusFlags::empty()
            }),
            Err(Error::UnsupportedFormat(unknown))
        );
        assert_eq!(n.negotiated(), None);
    }

    #[test]
    fn check_stores_bus_config() {
        let mut n = negotiator(1, InterfaceKind::Parallel);
        n.check(rgb888()).unwrap();
        assert_eq!(n.negotiated(), Some(rgb888()));
    }

    #[test]
    fn negotiate_skips_formats_the_sink_refuses() {
        let mut n = Negotiator::new(0, InterfaceKind::Serial, Box::new(OnlyRgb));
        assert_eq!(
            n.negotiate(BusFlags::DE_HIGH),
            Ok(BusFormat::RGB565_1X16)
        );
        assert_eq!(n.negotiated().unwrap().flags, BusFlags::DE_HIGH);
    }

    #[test]
    fn negotiate_prefers_default_format() {
        let mut n = negotiator(0, InterfaceKind::Serial);
        assert_eq!(n.negotiate(BusFlags::empty()), Ok(BusFormat::FIXED));
    }

    #[test]
    fn enable_parallel_sequence() {
        let regs = FakeRegisters::new();
        regs.poke(disp_dp_config(0), DP_CONFIG_DP_EN);
        let mut n = negotiator(0, InterfaceKind::Parallel);
        n.check(BusConfig {
            format: BusFormat::RGB888_1X24,
            flags: BusFlags::DE_LOW | BusFlags::PIXDATA_DRIVE_NEGEDGE,
        })
        .unwrap();

        n.enable(&regs).unwrap();

        assert_eq!(regs.peek(disp_dp_config(0)), 0);
        assert_eq!(regs.peek(disp_dpi_config(0)), DPI_CONFIG_FMT_RGB888);
        assert_eq!(
            regs.peek(disp_panel_config(0)),
            PANEL_CONFIG_DE_POL
                | PANEL_CONFIG_CLK_POL
                | PANEL_CONFIG_DE_EN
                | PANEL_CONFIG_DAT_EN
                | PANEL_CONFIG_CLK_EN
                | PANEL_CONFIG_RUNNING
        );
        assert_eq!(regs.peek(DISP_PANEL_START), panel_start_running(0));
        // the commit latch is the last write
        assert_eq!(
            regs.writes().last(),
            Some(&(disp_panel_config_ex(0), PANEL_CONFIG_EX_COMMIT))
        );
    }

    #[test]
    fn enable_serial_yuv_sets_panel_flag() {
        let regs = FakeRegisters::new();
        let mut n = negotiator(1, InterfaceKind::Serial);
        n.check(BusConfig {
            format: BusFormat::YUV8_1X24,
            flags: BusFlags::empty(),
        })
        .unwrap();

        n.enable(&regs).unwrap();

        assert_eq!(
            regs.peek(disp_dp_config(1)),
            DP_CONFIG_YUV_FMT_YUV8 | DP_CONFIG_DP_EN
        );
        let panel = regs.peek(disp_panel_config(1));
        assert_ne!(panel & PANEL_CONFIG_YUV, 0);
        assert_eq!(panel & (PANEL_CONFIG_DE_POL | PANEL_CONFIG_CLK_POL), 0);
        assert_eq!(regs.peek(DISP_PANEL_START), panel_start_running(1));
    }

    #[test]
    fn enable_without_negotiation_writes_nothing() {
        let regs = FakeRegisters::new();
        let n = negotiator(0, InterfaceKind::Serial);
        assert_eq!(n.enable(&regs), Err(Error::NotNegotiated(0)));
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn disable_keeps_other_outputs_running() {
        let regs = FakeRegisters::new();
        let mut a = negotiator(0, InterfaceKind::Parallel);
        let mut b = negotiator(1, InterfaceKind::Serial);
        a.check(rgb888()).unwrap();
        b.check(rgb888()).unwrap();

        a.enable(&regs).unwrap();
        b.enable(&regs).unwrap();
        assert_eq!(
            regs.peek(DISP_PANEL_START),
            panel_start_running(0) | panel_start_running(1)
        );

        regs.clear_log();
        a.disable(&regs).unwrap();

        assert_eq!(regs.peek(DISP_PANEL_START), panel_start_running(1));
        assert_eq!(regs.peek(disp_panel_config(0)) & PANEL_CONFIG_RUNNING, 0);
        assert_ne!(regs.peek(disp_panel_config(1)) & PANEL_CONFIG_RUNNING, 0);

        // shared register first, commit latch last
        let writes = regs.writes();
        assert_eq!(writes.first().map(|w| w.0), Some(DISP_PANEL_START));
        assert_eq!(
            writes.last(),
            Some(&(disp_panel_config_ex(0), PANEL_CONFIG_EX_COMMIT))
        );
    }

    #[test]
    fn detect_interface_kind() {
        let mut graph = FakeGraph::new(&[(true, false), (false, true), (false, false)]);

        let parallel = Negotiator::detect(&mut graph, 0).unwrap().unwrap();
        assert_eq!(parallel.kind(), InterfaceKind::Parallel);
        let serial = Negotiator::detect(&mut graph, 1).unwrap().unwrap();
        assert_eq!(serial.kind(), InterfaceKind::Serial);
        assert!(Negotiator::detect(&mut graph, 2).unwrap().is_none());
    }

    #[test]
    fn detect_rejects_two_endpoints() {
        let mut graph = FakeGraph::new(&[(true, true)]);
        assert!(matches!(
            Negotiator::detect(&mut graph, 0),
            Err(Error::AmbiguousInterface(0))
        ));
    }
}
