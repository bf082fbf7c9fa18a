//! Guest/host address translation

use crate::protocol::GuestAddr;
use core::ffi::c_void;

/// Pointer translation between the guest and host address spaces
///
/// Both directions are total for previously valid pointers and map null to
/// null.
pub trait AddressSpace: Send + Sync {
    /// Guest reference → host pointer
    fn g2h(&self, addr: GuestAddr) -> *mut c_void;

    /// Host pointer → guest reference
    fn h2g(&self, ptr: *const c_void) -> GuestAddr;
}

/// Guest and host share one address space
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySpace;

impl AddressSpace for IdentitySpace {
    #[inline]
    fn g2h(&self, addr: GuestAddr) -> *mut c_void {
        addr as usize as *mut c_void
    }

    #[inline]
    fn h2g(&self, ptr: *const c_void) -> GuestAddr {
        ptr as usize as GuestAddr
    }
}

/// Guest addresses are offsets from a host base, as with an emulator's
/// guest memory mapping
#[derive(Debug, Clone, Copy)]
pub struct OffsetSpace {
    base: usize,
}

impl OffsetSpace {
    #[inline]
    pub fn new(base: *const u8) -> Self {
        Self {
            base: base as usize,
        }
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }
}

impl AddressSpace for OffsetSpace {
    #[inline]
    fn g2h(&self, addr: GuestAddr) -> *mut c_void {
        if addr == 0 {
            return core::ptr::null_mut();
        }
        self.base.wrapping_add(addr as usize) as *mut c_void
    }

    #[inline]
    fn h2g(&self, ptr: *const c_void) -> GuestAddr {
        if ptr.is_null() {
            return 0;
        }
        (ptr as usize).wrapping_sub(self.base) as GuestAddr
    }
}

impl<S: AddressSpace + ?Sized> AddressSpace for std::sync::Arc<S> {
    #[inline]
    fn g2h(&self, addr: GuestAddr) -> *mut c_void {
        (**self).g2h(addr)
    }

    #[inline]
    fn h2g(&self, ptr: *const c_void) -> GuestAddr {
        (**self).h2g(ptr)
    }
}
