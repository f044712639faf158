//! Concrete contracts for kernel objects, dynamic modules and processes.
//!
//! Kernel objects and processes share the close primitive but are separate
//! contracts, so a `ProcessHandle` never type-checks where a `KernelHandle`
//! is expected.

use super::contract::ResourceContract;
use super::owned::Handle;
use crate::config::types::{GuardError, Result};
use crate::kernel::{report_release_failure, ModulePtr, Native, Platform, RawHandle};
use std::ffi::{c_void, CString};

/// Generic kernel object: file descriptor on Unix, HANDLE on Windows.
pub enum KernelObject {}

/// Loaded dynamic module: dlopen handle on Unix, HMODULE on Windows.
pub enum DynamicModule {}

/// Running process: pidfd on Linux, process HANDLE on Windows.
pub enum ProcessObject {}

impl ResourceContract for KernelObject {
    type Value = RawHandle;
    const KIND: &'static str = "kernel object";

    fn invalid() -> RawHandle {
        Native::NULL_HANDLE
    }

    fn release(value: RawHandle) {
        if let Err(e) = Native::close_handle(value) {
            report_release_failure(Self::KIND, &value, &e);
        }
    }
}

impl ResourceContract for DynamicModule {
    type Value = ModulePtr;
    const KIND: &'static str = "dynamic module";

    fn invalid() -> ModulePtr {
        ModulePtr::NULL
    }

    fn release(value: ModulePtr) {
        if let Err(e) = Native::unload_module(value) {
            report_release_failure(Self::KIND, &value, &e);
        }
    }
}

impl ResourceContract for ProcessObject {
    type Value = RawHandle;
    const KIND: &'static str = "process";

    fn invalid() -> RawHandle {
        Native::NULL_HANDLE
    }

    fn release(value: RawHandle) {
        if let Err(e) = Native::close_handle(value) {
            report_release_failure(Self::KIND, &value, &e);
        }
    }
}

pub type KernelHandle = Handle<KernelObject>;
pub type ModuleHandle = Handle<DynamicModule>;
pub type ProcessHandle = Handle<ProcessObject>;

impl Handle<DynamicModule> {
    /// Load a module by file name or path.
    pub fn load(name: &str) -> Result<Self> {
        let name_c = CString::new(name)
            .map_err(|_| GuardError::Module(format!("module name contains NUL byte: {:?}", name)))?;
        let module = Native::load_module(&name_c)?;
        log::debug!("loaded module {} as {:?}", name, module);
        Ok(Self::from_raw(module))
    }

    /// Resolve an exported symbol. The pointer is only meaningful while
    /// this handle keeps the module loaded.
    pub fn symbol(&self, name: &str) -> Result<*mut c_void> {
        if !self.is_valid() {
            return Err(GuardError::NotAcquired(DynamicModule::KIND));
        }
        let name_c = CString::new(name)
            .map_err(|_| GuardError::Symbol(format!("symbol name contains NUL byte: {:?}", name)))?;
        Native::resolve_symbol(self.get(), &name_c)
    }
}

impl Handle<ProcessObject> {
    pub fn open(pid: u32) -> Result<Self> {
        Ok(Self::from_raw(Native::open_process(pid)?))
    }

    /// Handle to the calling process.
    pub fn current() -> Result<Self> {
        Self::open(std::process::id())
    }
}

#[cfg(unix)]
mod unix_fd {
    use super::{KernelHandle, ProcessHandle};
    use crate::config::types::Result;
    use nix::fcntl::OFlag;
    use nix::sys::stat::Mode;
    use std::fs::File;
    use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
    use std::path::Path;

    impl KernelHandle {
        /// Open `path` read-only with close-on-exec.
        pub fn open_read_only(path: &Path) -> Result<Self> {
            let fd = nix::fcntl::open(path, OFlag::O_RDONLY | OFlag::O_CLOEXEC, Mode::empty())?;
            Ok(Self::from_raw(fd))
        }
    }

    impl From<OwnedFd> for KernelHandle {
        fn from(fd: OwnedFd) -> Self {
            Self::from_raw(fd.into_raw_fd())
        }
    }

    impl From<File> for KernelHandle {
        fn from(file: File) -> Self {
            Self::from_raw(file.into_raw_fd())
        }
    }

    impl AsRawFd for KernelHandle {
        fn as_raw_fd(&self) -> RawFd {
            self.get()
        }
    }

    impl AsRawFd for ProcessHandle {
        fn as_raw_fd(&self) -> RawFd {
            self.get()
        }
    }
}
