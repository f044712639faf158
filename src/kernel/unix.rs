//! Unix backend: file descriptors, dlopen modules, pidfd process handles.
//!
//! There is no threading-model apartment on Unix; initialization always
//! succeeds and finalization does nothing.

use super::{ApartmentBackend, ModulePtr, Platform};
use crate::config::types::{ApartmentOptions, GuardError, Result};
use std::ffi::{c_void, CStr};
use std::io;
use std::os::fd::RawFd;

pub struct UnixPlatform;

impl Platform for UnixPlatform {
    type RawHandle = RawFd;

    const NULL_HANDLE: RawFd = -1;

    fn close_handle(handle: RawFd) -> io::Result<()> {
        // Never retry on EINTR: Linux releases the descriptor regardless.
        nix::unistd::close(handle).map_err(io::Error::from)
    }

    fn load_module(name: &CStr) -> Result<ModulePtr> {
        // SAFETY: name is a valid NUL-terminated string; RTLD_NOW resolves
        // every symbol up front and RTLD_LOCAL keeps them private to this handle.
        let handle = unsafe { libc::dlopen(name.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(GuardError::Module(format!(
                "dlopen {:?} failed: {}",
                name,
                last_dl_error()
            )));
        }
        Ok(ModulePtr::from_ptr(handle))
    }

    fn resolve_symbol(module: ModulePtr, name: &CStr) -> Result<*mut c_void> {
        // SAFETY: dlerror only reads/clears thread-local loader state.
        unsafe {
            libc::dlerror();
        }
        // SAFETY: module came from dlopen and is still loaded (the caller
        // holds the owning ModuleHandle); name is NUL-terminated.
        let ptr = unsafe { libc::dlsym(module.as_ptr(), name.as_ptr()) };
        if ptr.is_null() {
            return Err(GuardError::Symbol(format!(
                "dlsym {:?} failed: {}",
                name,
                last_dl_error()
            )));
        }
        Ok(ptr)
    }

    fn unload_module(module: ModulePtr) -> io::Result<()> {
        // SAFETY: module came from dlopen and is closed exactly once by its owner.
        let rc = unsafe { libc::dlclose(module.as_ptr()) };
        if rc != 0 {
            return Err(io::Error::new(io::ErrorKind::Other, last_dl_error()));
        }
        Ok(())
    }

    fn open_process(pid: u32) -> Result<RawFd> {
        #[cfg(target_os = "linux")]
        {
            // SAFETY: pidfd_open(2) takes a pid and a flags word; no pointers involved.
            let fd = unsafe { libc::syscall(libc::SYS_pidfd_open, pid as libc::pid_t, 0 as libc::c_uint) };
            if fd < 0 {
                let err = io::Error::last_os_error();
                return Err(GuardError::Process(format!("pidfd_open({}) failed: {}", pid, err)));
            }
            Ok(fd as RawFd)
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(GuardError::Process(format!(
                "process handle for pid {} requires pidfd support",
                pid
            )))
        }
    }
}

impl ApartmentBackend for UnixPlatform {
    fn initialize(options: ApartmentOptions) -> bool {
        log::debug!("apartment initialize {:?}: no threading model on unix", options);
        true
    }

    fn uninitialize() {}
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns either null or a pointer to a thread-local,
    // NUL-terminated message valid until the next dl* call on this thread.
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        "unknown dynamic loader error".to_string()
    } else {
        // SAFETY: err is non-null and points at a NUL-terminated message that
        // no other dl* call on this thread has invalidated yet.
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }
}
