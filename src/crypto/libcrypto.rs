//! OpenSSL libcrypto as a cipher provider, loaded at runtime.
//!
//! The library is opened through a [`ModuleHandle`] and the matched pair
//! `EVP_CIPHER_CTX_new` / `EVP_CIPHER_CTX_free` is resolved from it. Every
//! `CipherContext` borrows the provider, so the module stays loaded until
//! the last context is freed.

use super::provider::CipherProvider;
use crate::config::types::{GuardError, Result};
use crate::handle::ModuleHandle;
use std::ptr::NonNull;

/// Opaque `EVP_CIPHER_CTX`.
#[repr(C)]
pub struct EvpCipherCtx {
    _private: [u8; 0],
}

type CtxNewFn = unsafe extern "C" fn() -> *mut EvpCipherCtx;
type CtxFreeFn = unsafe extern "C" fn(*mut EvpCipherCtx);

#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARIES: &[&str] = &[
    "libcrypto-3-x64.dll",
    "libcrypto-3.dll",
    "libcrypto-1_1-x64.dll",
];
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARIES: &[&str] = &["libcrypto.3.dylib", "libcrypto.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LIBRARIES: &[&str] = &["libcrypto.so.3", "libcrypto.so.1.1", "libcrypto.so"];

pub struct LibCrypto {
    module: ModuleHandle,
    ctx_new: CtxNewFn,
    ctx_free: CtxFreeFn,
}

impl LibCrypto {
    /// Load the first available library from [`DEFAULT_LIBRARIES`].
    pub fn load() -> Result<Self> {
        let mut failures = Vec::new();
        for name in DEFAULT_LIBRARIES {
            match Self::load_from(name) {
                Ok(provider) => return Ok(provider),
                Err(e) => {
                    log::debug!("libcrypto candidate {} rejected: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }
        Err(GuardError::Module(format!(
            "no usable libcrypto found ({})",
            failures.join(", ")
        )))
    }

    pub fn load_from(name: &str) -> Result<Self> {
        let module = ModuleHandle::load(name)?;
        let ctx_new = module.symbol("EVP_CIPHER_CTX_new")?;
        let ctx_free = module.symbol("EVP_CIPHER_CTX_free")?;

        log::info!("libcrypto provider loaded from {}", name);

        // SAFETY: both symbols are documented OpenSSL entry points with
        // exactly these C signatures; the pointers stay valid while `module`
        // is loaded, which lives as long as `self`.
        let (ctx_new, ctx_free) = unsafe {
            (
                std::mem::transmute::<*mut std::ffi::c_void, CtxNewFn>(ctx_new),
                std::mem::transmute::<*mut std::ffi::c_void, CtxFreeFn>(ctx_free),
            )
        };

        Ok(Self {
            module,
            ctx_new,
            ctx_free,
        })
    }

    pub fn module(&self) -> &ModuleHandle {
        &self.module
    }
}

impl CipherProvider for LibCrypto {
    type Context = EvpCipherCtx;

    fn allocate(&self) -> Option<NonNull<EvpCipherCtx>> {
        // SAFETY: EVP_CIPHER_CTX_new takes no arguments and returns null on failure.
        NonNull::new(unsafe { (self.ctx_new)() })
    }

    unsafe fn free(&self, ctx: NonNull<EvpCipherCtx>) {
        (self.ctx_free)(ctx.as_ptr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherContext, CipherState};

    #[test]
    fn missing_library_is_module_error() {
        let result = LibCrypto::load_from("librawguard-no-such-crypto.so");
        assert!(matches!(result, Err(GuardError::Module(_))));
    }

    #[test]
    fn system_libcrypto_round_trip() {
        // Hosts without OpenSSL only exercise the failure path above.
        let provider = match LibCrypto::load() {
            Ok(provider) => provider,
            Err(e) => {
                println!("libcrypto unavailable: {}", e);
                return;
            }
        };
        assert!(provider.module().is_valid());

        let mut ctx = CipherContext::new(&provider);
        assert!(ctx.is_owning());
        ctx.free();
        assert_eq!(ctx.state(), CipherState::Freed);
    }
}
