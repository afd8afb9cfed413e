// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Abstract read/modify/write access to memory-mapped registers.

/// Access to 32-bit memory-mapped control/status registers.
///
/// Implementations carry no sequencing logic of their own. A handle is
/// injected into each bring-up component at construction; by convention every
/// register group has exactly one owning component, which stands in for
/// locking on this class of hardware.
///
/// Reads take `&self` because hardware status reads are side-effect free from
/// the software side; simulated backends use interior mutability to model
/// status bits that come up over time.
pub trait RegisterAccess {
    fn read(&self, addr: u32) -> u32;
    fn write(&mut self, addr: u32, value: u32);

    /// Read-modify-write: clear `clear`, set `set`, preserve everything else
    /// including reserved and undocumented bits.
    fn modify(&mut self, addr: u32, clear: u32, set: u32) {
        let current = self.read(addr);
        self.write(addr, (current & !clear) | set);
    }
}

impl<R: RegisterAccess> RegisterAccess for &mut R {
    fn read(&self, addr: u32) -> u32 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u32, value: u32) {
        (**self).write(addr, value)
    }
}

/// Volatile access to the real register file.
pub struct Mmio(());

impl Mmio {
    /// # Safety
    ///
    /// Must only be constructed on the target device, and the register
    /// groups driven through this handle must have no other concurrent
    /// writer.
    pub const unsafe fn new() -> Self {
        Mmio(())
    }
}

impl RegisterAccess for Mmio {
    fn read(&self, addr: u32) -> u32 {
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write(&mut self, addr: u32, value: u32) {
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}
