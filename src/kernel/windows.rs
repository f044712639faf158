//! Windows backend: kernel HANDLEs, HMODULEs, COM apartments.

use super::{ApartmentBackend, ModulePtr, Platform};
use crate::config::types::{ApartmentOptions, GuardError, Result};
use std::ffi::{c_void, CStr};
use std::io;

/// HANDLE as an integer so the value stays `Send`.
pub type Handle = isize;

const PROCESS_QUERY_LIMITED_INFORMATION: u32 = 0x1000;
const SYNCHRONIZE: u32 = 0x0010_0000;

pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    type RawHandle = Handle;

    const NULL_HANDLE: Handle = 0;

    fn close_handle(handle: Handle) -> io::Result<()> {
        // SAFETY: handle was returned by a kernel object constructor and is
        // closed exactly once by its owner.
        if unsafe { CloseHandle(handle) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn load_module(name: &CStr) -> Result<ModulePtr> {
        // SAFETY: name is a valid NUL-terminated ANSI string.
        let module = unsafe { LoadLibraryA(name.as_ptr()) };
        if module.is_null() {
            return Err(GuardError::Module(format!(
                "LoadLibraryA {:?} failed: {}",
                name,
                io::Error::last_os_error()
            )));
        }
        Ok(ModulePtr::from_ptr(module))
    }

    fn resolve_symbol(module: ModulePtr, name: &CStr) -> Result<*mut c_void> {
        // SAFETY: module is a live HMODULE held by its owner; name is NUL-terminated.
        let ptr = unsafe { GetProcAddress(module.as_ptr(), name.as_ptr()) };
        if ptr.is_null() {
            return Err(GuardError::Symbol(format!(
                "GetProcAddress {:?} failed: {}",
                name,
                io::Error::last_os_error()
            )));
        }
        Ok(ptr)
    }

    fn unload_module(module: ModulePtr) -> io::Result<()> {
        // SAFETY: module came from LoadLibraryA and is freed exactly once.
        if unsafe { FreeLibrary(module.as_ptr()) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn open_process(pid: u32) -> Result<Handle> {
        // SAFETY: OpenProcess takes plain integers and returns null on failure.
        let handle =
            unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION | SYNCHRONIZE, 0, pid) };
        if handle == 0 {
            return Err(GuardError::Process(format!(
                "OpenProcess({}) failed: {}",
                pid,
                io::Error::last_os_error()
            )));
        }
        Ok(handle)
    }
}

impl ApartmentBackend for WindowsPlatform {
    fn initialize(options: ApartmentOptions) -> bool {
        // SAFETY: reserved must be null; the flag word is built from COINIT values.
        let hr = unsafe { CoInitializeEx(std::ptr::null_mut(), options.bits()) };
        // S_OK and S_FALSE both owe a CoUninitialize; negative HRESULTs
        // (e.g. RPC_E_CHANGED_MODE) do not.
        if hr < 0 {
            log::warn!("CoInitializeEx({:#x}) failed: HRESULT {:#010x}", options.bits(), hr);
            return false;
        }
        true
    }

    fn uninitialize() {
        // SAFETY: only called by a guard that observed a successful initialize
        // on this thread.
        unsafe { CoUninitialize() }
    }
}

#[link(name = "kernel32")]
extern "system" {
    fn CloseHandle(handle: Handle) -> i32;
    fn LoadLibraryA(name: *const i8) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, name: *const i8) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> i32;
    fn OpenProcess(access: u32, inherit: i32, pid: u32) -> Handle;
}

#[link(name = "ole32")]
extern "system" {
    fn CoInitializeEx(reserved: *mut c_void, coinit: u32) -> i32;
    fn CoUninitialize();
}
