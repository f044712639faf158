//! Scoped threading-model initialization.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --initialize(ok)--> Initialized --drop--> Uninitialized
//! Uninitialized --initialize(failed)--> Uninitialized --drop--> (no finalize)
//! ```
//!
//! The guard is built by its constructor only, so a single instance can never
//! attempt initialization twice. It is `!Send`: the finalizer must run on the
//! thread that initialized.

use crate::config::types::{ApartmentOptions, GuardError, Result};
use crate::kernel::{ApartmentBackend, Native};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApartmentState {
    Uninitialized,
    Initialized,
}

/// Owner of one apartment initialization on the current thread.
pub struct ApartmentGuard<B: ApartmentBackend = Native> {
    state: ApartmentState,
    _thread_bound: PhantomData<*const ()>,
    _backend: PhantomData<fn() -> B>,
}

impl ApartmentGuard<Native> {
    /// Initialize the calling thread's apartment with the native backend.
    pub fn new(options: ApartmentOptions) -> Self {
        Self::initialize(options)
    }

    pub fn multithreaded() -> Self {
        Self::initialize(ApartmentOptions::MULTITHREADED)
    }

    pub fn apartment_threaded() -> Self {
        Self::initialize(ApartmentOptions::APARTMENT_THREADED)
    }
}

impl<B: ApartmentBackend> ApartmentGuard<B> {
    /// Attempt initialization. Failure leaves the guard `Uninitialized`.
    pub fn initialize(options: ApartmentOptions) -> Self {
        let state = if B::initialize(options) {
            log::debug!("apartment initialized with {:?}", options);
            ApartmentState::Initialized
        } else {
            log::warn!("apartment initialization failed for {:?}", options);
            ApartmentState::Uninitialized
        };

        Self {
            state,
            _thread_bound: PhantomData,
            _backend: PhantomData,
        }
    }

    pub fn ok(&self) -> bool {
        self.state == ApartmentState::Initialized
    }

    pub fn state(&self) -> ApartmentState {
        self.state
    }

    pub fn ensure_ok(self) -> Result<Self> {
        if self.ok() {
            Ok(self)
        } else {
            Err(GuardError::NotAcquired("apartment"))
        }
    }
}

impl<B: ApartmentBackend> Drop for ApartmentGuard<B> {
    fn drop(&mut self) {
        if self.state == ApartmentState::Initialized {
            B::uninitialize();
            self.state = ApartmentState::Uninitialized;
            log::debug!("apartment uninitialized");
        }
    }
}

impl<B: ApartmentBackend> std::fmt::Debug for ApartmentGuard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApartmentGuard").field("state", &self.state).finish()
    }
}
