//! rawguard: single-owner lifecycle management for native resources
//!
//! Every native resource held through this crate has exactly one owner and is
//! released exactly once, on drop or on explicit early release, on every exit
//! path.
//!
//! # Architecture
//!
//! ## Handle Ownership ([`handle`])
//! - [`handle::contract`]: static per-kind release contract (value type, invalid sentinel, release)
//! - [`handle::owned`]: generic move-only [`Handle`] over a contract
//! - [`handle::bindings`]: kernel-object, dynamic-module and process bindings
//!
//! ## Apartment ([`apartment`])
//! - [`apartment::ApartmentGuard`]: scoped threading-model initialize/finalize
//!
//! ## Cipher Contexts ([`crypto`])
//! - [`crypto::provider`]: matched allocate/free pair of an external crypto provider
//! - [`crypto::context`]: owner of one provider context with a three-state lifecycle
//! - [`crypto::libcrypto`]: OpenSSL libcrypto provider loaded at runtime
//!
//! ## Platform Backends ([`kernel`])
//! - [`kernel::Platform`] / [`kernel::ApartmentBackend`]: the only place that
//!   calls the operating system; one implementation per target
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: error taxonomy and shared enums
//! - [`config::loader`]: rawguard.json loading and process-wide settings
//!
//! # Failure Model
//!
//! 1. **Acquisition failure is state** - an empty handle, `ok() == false`, or
//!    an unallocated context; never a panic from the owner
//! 2. **Release failure is logged, never surfaced** - reported at the backend
//!    boundary at the configured level and otherwise discarded
//! 3. **Invalid means no-op** - release never runs on a sentinel, so partially
//!    constructed aggregates release exactly what they acquired

// Handle Ownership
pub mod handle;

// Apartment
pub mod apartment;

// Cipher Contexts
pub mod crypto;

// Platform Backends
pub mod kernel;

// Configuration
pub mod config;

// CLI entrypoint wiring for the rawguard probe binary.
pub mod cli;

pub use apartment::{ApartmentGuard, ApartmentState};
pub use config::types::{ApartmentMode, ApartmentOptions, GuardError, ReleaseLogLevel, Result};
pub use crypto::{CipherContext, CipherProvider, CipherState};
pub use handle::{
    Handle, KernelHandle, KernelObject, ModuleHandle, ProcessHandle, ProcessObject,
    ResourceContract,
};
