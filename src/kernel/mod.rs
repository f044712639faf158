//! Thin wrappers around platform release and acquisition primitives.
//!
//! All `unsafe` FFI is concentrated here with explicit SAFETY comments.
//! Exactly one backend is compiled per target and exported as [`Native`];
//! the owners in `handle`, `apartment` and `crypto` only ever call through
//! the [`Platform`] and [`ApartmentBackend`] traits.

use crate::config::types::{ApartmentOptions, Result};
use std::ffi::{c_void, CStr};
use std::fmt;
use std::io;

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub type Native = unix::UnixPlatform;
#[cfg(windows)]
pub type Native = windows::WindowsPlatform;

#[cfg(not(any(unix, windows)))]
compile_error!("rawguard has no platform backend for this target");

/// Native kernel-object handle value for the current target
pub type RawHandle = <Native as Platform>::RawHandle;

/// Operating-system primitives the handle bindings are built on.
pub trait Platform {
    /// Kernel-object and process handle representation.
    type RawHandle: Copy + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Platform null-handle sentinel.
    const NULL_HANDLE: Self::RawHandle;

    /// Close a kernel-object or process handle.
    fn close_handle(handle: Self::RawHandle) -> io::Result<()>;

    /// Load a dynamic module by name.
    fn load_module(name: &CStr) -> Result<ModulePtr>;

    /// Resolve an exported symbol from a loaded module.
    fn resolve_symbol(module: ModulePtr, name: &CStr) -> Result<*mut c_void>;

    /// Unload a module previously returned by `load_module`.
    fn unload_module(module: ModulePtr) -> io::Result<()>;

    /// Open a handle referring to a running process.
    fn open_process(pid: u32) -> Result<Self::RawHandle>;
}

/// Threading-model initializer and finalizer for the calling thread.
pub trait ApartmentBackend {
    /// Returns true when a matching `uninitialize` is now owed.
    fn initialize(options: ApartmentOptions) -> bool;

    fn uninitialize();
}

/// Opaque dynamic-module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ModulePtr(*mut c_void);

impl ModulePtr {
    pub const NULL: Self = Self(std::ptr::null_mut());

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

// SAFETY: a module handle is a process-global token; the loader's
// reference counting is internally synchronized on every supported platform.
unsafe impl Send for ModulePtr {}
unsafe impl Sync for ModulePtr {}

/// Report a failed release call. Never propagates.
pub(crate) fn report_release_failure(kind: &str, value: &dyn fmt::Debug, err: &io::Error) {
    if let Some(level) = crate::config::release_failure_level().log_level() {
        log::log!(level, "release of {} {:?} failed: {}", kind, value, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_ptr_null_sentinel() {
        assert!(ModulePtr::NULL.is_null());
        assert_eq!(ModulePtr::from_ptr(std::ptr::null_mut()), ModulePtr::NULL);

        let mut marker = 0u8;
        let ptr = ModulePtr::from_ptr(&mut marker as *mut u8 as *mut c_void);
        assert!(!ptr.is_null());
    }

    #[test]
    fn report_release_failure_never_panics() {
        let err = io::Error::from_raw_os_error(9);
        report_release_failure("kernel object", &-1i32, &err);
    }
}
