//! Contains the register access interface

use crate::register::MAX_REGISTER;
use embedded_hal::delay::DelayNs;

/// Interface Error
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The register offset is outside of the register window
    OutOfRange(u32),
    /// The register offset is not aligned to the 32bit register stride
    Unaligned(u32),
    /// A register did not reach the expected state in time
    Timeout,
}

/// Trait to describe the register space of the controller
/// All outputs share one register map, therefore access only needs a shared reference
pub trait RegisterMap {
    /// read a 32bit register
    fn read(&self, reg: u32) -> Result<u32, Error>;

    /// write a 32bit register
    fn write(&self, reg: u32, value: u32) -> Result<(), Error>;

    /// replace the bits selected by mask with value
    fn update_bits(&self, reg: u32, mask: u32, value: u32) -> Result<(), Error> {
        let old = self.read(reg)?;
        self.write(reg, (old & !mask) | (value & mask))
    }

    /// set all bits of mask
    fn set_bits(&self, reg: u32, bits: u32) -> Result<(), Error> {
        self.update_bits(reg, bits, bits)
    }

    /// clear all bits of mask
    fn clear_bits(&self, reg: u32, bits: u32) -> Result<(), Error> {
        self.update_bits(reg, bits, 0)
    }

    /// set or clear all bits of mask depending on value
    fn assign_bits(&self, reg: u32, bits: u32, value: bool) -> Result<(), Error> {
        if value {
            self.set_bits(reg, bits)
        } else {
            self.clear_bits(reg, bits)
        }
    }

    /// active wait until the register content fulfills the condition
    /// gives up after the given number of attempts with a Timeout
    fn poll<D, F>(
        &self,
        reg: u32,
        delay: &mut D,
        interval_us: u32,
        attempts: u32,
        condition: F,
    ) -> Result<u32, Error>
    where
        Self: Sized,
        D: DelayNs,
        F: Fn(u32) -> bool,
    {
        let mut counter = 0u32;
        loop {
            let value = self.read(reg)?;
            if condition(value) {
                return Ok(value);
            }
            if counter >= attempts {
                return Err(Error::Timeout);
            }
            counter += 1;
            delay.delay_us(interval_us);
        }
    }
}

/// Implements the register interface for a memory mapped register window
pub struct MmioRegisters {
    base: *mut u8,
    size: usize,
}

impl MmioRegisters {
    /// Create a new mmio register interface
    ///
    /// # Safety
    /// `base` must point to the mapped register window of the controller with at least `size`
    /// bytes, and the mapping must stay valid as long as this object exists.
    pub unsafe fn new(base: *mut u8, size: usize) -> MmioRegisters {
        MmioRegisters { base, size }
    }

    fn offset(&self, reg: u32) -> Result<usize, Error> {
        if reg % 4 != 0 {
            return Err(Error::Unaligned(reg));
        }
        if reg > MAX_REGISTER || reg as usize + 4 > self.size {
            return Err(Error::OutOfRange(reg));
        }
        Ok(reg as usize)
    }
}

impl RegisterMap for MmioRegisters {
    fn read(&self, reg: u32) -> Result<u32, Error> {
        let offset = self.offset(reg)?;
        // offset is checked against the window size and aligned
        let value = unsafe { core::ptr::read_volatile(self.base.add(offset) as *const u32) };
        Ok(value)
    }

    fn write(&self, reg: u32, value: u32) -> Result<(), Error> {
        let offset = self.offset(reg)?;
        unsafe { core::ptr::write_volatile(self.base.add(offset) as *mut u32, value) };
        Ok(())
    }
}
