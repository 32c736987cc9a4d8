//! Capability database of the known controller revisions

use crate::format::Fourcc;
use crate::interface::RegisterMap;
use crate::register;
use crate::Error;

/// A set of plane formats supported by a controller
#[derive(Debug, PartialEq, Eq)]
pub struct FormatSet {
    /// supported buffer formats
    pub formats: &'static [Fourcc],
}

const RGB_FORMATS: [Fourcc; 30] = [
    Fourcc::XRGB4444,
    Fourcc::XBGR4444,
    Fourcc::RGBX4444,
    Fourcc::BGRX4444,
    Fourcc::ARGB4444,
    Fourcc::ABGR4444,
    Fourcc::RGBA4444,
    Fourcc::BGRA4444,
    Fourcc::XRGB1555,
    Fourcc::XBGR1555,
    Fourcc::RGBX5551,
    Fourcc::BGRX5551,
    Fourcc::ARGB1555,
    Fourcc::ABGR1555,
    Fourcc::RGBA5551,
    Fourcc::BGRA5551,
    Fourcc::RGB565,
    Fourcc::BGR565,
    Fourcc::XRGB8888,
    Fourcc::XBGR8888,
    Fourcc::RGBX8888,
    Fourcc::BGRX8888,
    Fourcc::ARGB8888,
    Fourcc::ABGR8888,
    Fourcc::RGBA8888,
    Fourcc::BGRA8888,
    Fourcc::ARGB2101010,
    Fourcc::ABGR2101010,
    Fourcc::RGBA1010102,
    Fourcc::BGRA1010102,
];

/// Formats of controllers without YUV444 support
pub static FORMATS_NO_YUV444: FormatSet = FormatSet {
    formats: &RGB_FORMATS,
};

/// Formats of controllers with YUV444 support
/// The plane path only handles RGB so far, so the list matches FORMATS_NO_YUV444
pub static FORMATS_WITH_YUV444: FormatSet = FormatSet {
    formats: &RGB_FORMATS,
};

/// Identity and capabilities of a controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    /// chip model, eg. 0x8200
    pub model: u32,
    /// chip revision
    pub revision: u32,
    /// customer id as probed from the hardware
    pub customer_id: u32,
    /// number of outputs the controller can drive
    pub display_count: usize,
    /// supported plane formats
    pub formats: &'static FormatSet,
}

/// Customer id part of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerMatch {
    /// matches only this customer id
    Exact(u32),
    /// matches every customer id
    Any,
}

/// One entry of the capability database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// chip model
    pub model: u32,
    /// chip revision
    pub revision: u32,
    /// customer id predicate
    pub customer: CustomerMatch,
    /// number of outputs
    pub display_count: usize,
    /// supported plane formats
    pub formats: &'static FormatSet,
}

impl Rule {
    /// Checks if the rule applies to the probed identity registers
    pub fn matches(&self, model: u32, revision: u32, customer_id: u32) -> bool {
        self.model == model
            && self.revision == revision
            && match self.customer {
                CustomerMatch::Exact(id) => id == customer_id,
                CustomerMatch::Any => true,
            }
    }

    fn resolve(&self, customer_id: u32) -> ChipIdentity {
        ChipIdentity {
            model: self.model,
            revision: self.revision,
            customer_id,
            display_count: self.display_count,
            formats: self.formats,
        }
    }
}

/// Known controllers, evaluated first match first.
/// Rules with a specific customer id must come before the wildcard rule of the same
/// model and revision, see `ordering_violation`.
// The vendor table lists the rev 0x5720 wildcard first, which makes the 0x310 and 0x311
// rules unreachable there. Customer 0x310 therefore resolves to FORMATS_WITH_YUV444 here but to
// the wildcard's FORMATS_NO_YUV444 in the vendor driver. Both sets are equal for now, this
// becomes visible once the YUV444 set gains formats.
pub static RULES: [Rule; 4] = [
    Rule {
        model: 0x8200,
        revision: 0x5721,
        customer: CustomerMatch::Exact(0x30B),
        display_count: 2,
        formats: &FORMATS_NO_YUV444,
    },
    Rule {
        model: 0x8200,
        revision: 0x5720,
        customer: CustomerMatch::Exact(0x310),
        display_count: 2,
        formats: &FORMATS_WITH_YUV444,
    },
    Rule {
        model: 0x8200,
        revision: 0x5720,
        customer: CustomerMatch::Exact(0x311),
        display_count: 2,
        formats: &FORMATS_NO_YUV444,
    },
    Rule {
        model: 0x8200,
        revision: 0x5720,
        customer: CustomerMatch::Any,
        display_count: 2,
        formats: &FORMATS_NO_YUV444,
    },
];

/// Looks up the identity in a rule table, the first matching rule wins
pub fn lookup(
    rules: &[Rule],
    model: u32,
    revision: u32,
    customer_id: u32,
) -> Result<ChipIdentity, Error> {
    rules
        .iter()
        .find(|rule| rule.matches(model, revision, customer_id))
        .map(|rule| rule.resolve(customer_id))
        .ok_or(Error::UnknownDevice {
            model,
            revision,
            customer_id,
        })
}

/// Returns the index of the first rule which is shadowed by an earlier wildcard rule
pub fn ordering_violation(rules: &[Rule]) -> Option<usize> {
    rules.iter().enumerate().find_map(|(index, rule)| {
        let shadowed = rules[..index].iter().any(|earlier| {
            earlier.customer == CustomerMatch::Any
                && earlier.model == rule.model
                && earlier.revision == rule.revision
        });
        shadowed.then_some(index)
    })
}

/// Reads the identity registers and resolves the controller capabilities
pub fn fill_chip_identity<R: RegisterMap>(regs: &R) -> Result<ChipIdentity, Error> {
    let model = regs.read(register::TOP_CHIP_MODEL)?;
    let revision = regs.read(register::TOP_CHIP_REV)?;
    let customer_id = regs.read(register::TOP_CHIP_CUSTOMER_ID)?;

    lookup(&RULES, model, revision, customer_id)
}
