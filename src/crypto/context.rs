//! Owner for one provider-allocated cipher context.
//!
//! Unlike [`Handle`](crate::handle::Handle) there is no sentinel policy: the
//! owner is built by attempting an allocation, and "allocation failed",
//! "owning" and "already freed" stay distinguishable through [`CipherState`].

use super::provider::CipherProvider;
use crate::config::types::{GuardError, Result};
use std::fmt;
use std::ptr::{self, NonNull};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherState {
    /// Nothing was ever owned: allocation failed, was not attempted, or
    /// ownership moved out.
    Unallocated,
    Owning,
    /// Owned context was returned to the provider.
    Freed,
}

enum Slot<C> {
    Unallocated,
    Owning(NonNull<C>),
    Freed,
}

/// Owner of one cipher context, borrowing the provider that allocated it.
/// The borrow keeps a context from outliving its provider.
pub struct CipherContext<'p, P: CipherProvider> {
    provider: &'p P,
    slot: Slot<P::Context>,
}

impl<'p, P: CipherProvider> CipherContext<'p, P> {
    /// Attempt one allocation. On failure the context is `Unallocated`.
    pub fn new(provider: &'p P) -> Self {
        let slot = match provider.allocate() {
            Some(ctx) => Slot::Owning(ctx),
            None => {
                log::warn!("cipher provider failed to allocate a context");
                Slot::Unallocated
            }
        };
        Self { provider, slot }
    }

    /// Non-owning context bound to `provider`, no allocation attempted.
    pub fn unallocated(provider: &'p P) -> Self {
        Self {
            provider,
            slot: Slot::Unallocated,
        }
    }

    pub fn is_owning(&self) -> bool {
        matches!(self.slot, Slot::Owning(_))
    }

    pub fn state(&self) -> CipherState {
        match self.slot {
            Slot::Unallocated => CipherState::Unallocated,
            Slot::Owning(_) => CipherState::Owning,
            Slot::Freed => CipherState::Freed,
        }
    }

    /// Raw context for provider calls; null unless owning.
    pub fn as_ptr(&self) -> *mut P::Context {
        match self.slot {
            Slot::Owning(ctx) => ctx.as_ptr(),
            _ => ptr::null_mut(),
        }
    }

    pub fn provider(&self) -> &'p P {
        self.provider
    }

    /// Return the context to the provider now. Repeated calls are no-ops.
    pub fn free(&mut self) {
        if let Slot::Owning(ctx) = self.slot {
            self.slot = Slot::Freed;
            // SAFETY: ctx came from this provider's allocate and the slot
            // was Owning, so it has not been freed yet.
            unsafe { self.provider.free(ctx) };
            log::debug!("cipher context {:p} freed", ctx);
        }
    }

    /// Move ownership into a new context, leaving this one `Unallocated`.
    pub fn take(&mut self) -> Self {
        let slot = match self.slot {
            Slot::Owning(ctx) => {
                self.slot = Slot::Unallocated;
                Slot::Owning(ctx)
            }
            _ => Slot::Unallocated,
        };
        Self {
            provider: self.provider,
            slot,
        }
    }

    /// Give up ownership without freeing.
    pub fn into_raw(mut self) -> Option<NonNull<P::Context>> {
        match self.slot {
            Slot::Owning(ctx) => {
                self.slot = Slot::Unallocated;
                Some(ctx)
            }
            _ => None,
        }
    }

    pub fn ensure_owning(self) -> Result<Self> {
        if self.is_owning() {
            Ok(self)
        } else {
            Err(GuardError::NotAcquired("cipher context"))
        }
    }
}

impl<P: CipherProvider> Drop for CipherContext<'_, P> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<P: CipherProvider> fmt::Debug for CipherContext<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("state", &self.state())
            .field("native", &self.as_ptr())
            .finish()
    }
}

// SAFETY: the context is exclusively owned; moving it to another thread is
// sound when the provider may be shared and the context itself is Send.
unsafe impl<P> Send for CipherContext<'_, P>
where
    P: CipherProvider + Sync,
    P::Context: Send,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Heap-backed provider that counts calls and can be told to fail.
    #[derive(Default)]
    struct MockProvider {
        fail: bool,
        allocs: Cell<usize>,
        frees: Cell<usize>,
    }

    impl MockProvider {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl CipherProvider for MockProvider {
        type Context = u64;

        fn allocate(&self) -> Option<NonNull<u64>> {
            if self.fail {
                return None;
            }
            self.allocs.set(self.allocs.get() + 1);
            NonNull::new(Box::into_raw(Box::new(0xC1F3)))
        }

        unsafe fn free(&self, ctx: NonNull<u64>) {
            self.frees.set(self.frees.get() + 1);
            drop(Box::from_raw(ctx.as_ptr()));
        }
    }

    #[test]
    fn allocation_success_frees_once() {
        let provider = MockProvider::default();
        {
            let ctx = CipherContext::new(&provider);
            assert!(ctx.is_owning());
            assert_eq!(ctx.state(), CipherState::Owning);
            assert!(!ctx.as_ptr().is_null());
            assert_eq!(unsafe { *ctx.as_ptr() }, 0xC1F3);
        }
        assert_eq!(provider.allocs.get(), 1);
        assert_eq!(provider.frees.get(), 1);
    }

    #[test]
    fn allocation_failure_is_non_owning() {
        let provider = MockProvider::failing();
        {
            let ctx = CipherContext::new(&provider);
            assert!(!ctx.is_owning());
            assert_eq!(ctx.state(), CipherState::Unallocated);
            assert!(ctx.as_ptr().is_null());
        }
        assert_eq!(provider.frees.get(), 0);
    }

    #[test]
    fn unallocated_never_frees() {
        let provider = MockProvider::default();
        drop(CipherContext::unallocated(&provider));
        assert_eq!(provider.allocs.get(), 0);
        assert_eq!(provider.frees.get(), 0);
    }

    #[test]
    fn explicit_free_is_idempotent() {
        let provider = MockProvider::default();
        let mut ctx = CipherContext::new(&provider);
        ctx.free();
        assert_eq!(ctx.state(), CipherState::Freed);
        assert!(ctx.as_ptr().is_null());
        ctx.free();
        drop(ctx);
        assert_eq!(provider.frees.get(), 1);
    }

    #[test]
    fn free_on_unallocated_stays_unallocated() {
        let provider = MockProvider::failing();
        let mut ctx = CipherContext::new(&provider);
        ctx.free();
        assert_eq!(ctx.state(), CipherState::Unallocated);
        assert_eq!(provider.frees.get(), 0);
    }

    #[test]
    fn take_transfers_pointer() {
        let provider = MockProvider::default();
        let mut source = CipherContext::new(&provider);
        let raw = source.as_ptr();
        let dest = source.take();
        assert!(!source.is_owning());
        assert_eq!(source.state(), CipherState::Unallocated);
        assert_eq!(dest.as_ptr(), raw);
        drop(source);
        assert_eq!(provider.frees.get(), 0);
        drop(dest);
        assert_eq!(provider.frees.get(), 1);
    }

    #[test]
    fn take_from_freed_keeps_freed_state() {
        let provider = MockProvider::default();
        let mut source = CipherContext::new(&provider);
        source.free();
        let dest = source.take();
        assert_eq!(source.state(), CipherState::Freed);
        assert_eq!(dest.state(), CipherState::Unallocated);
        drop(dest);
        drop(source);
        assert_eq!(provider.frees.get(), 1);
    }

    #[test]
    fn into_raw_relinquishes() {
        let provider = MockProvider::default();
        let raw = CipherContext::new(&provider).into_raw().unwrap();
        assert_eq!(provider.frees.get(), 0);
        unsafe { provider.free(raw) };
        assert_eq!(provider.frees.get(), 1);
    }

    #[test]
    fn ensure_owning_reports_failure() {
        let provider = MockProvider::failing();
        let err = CipherContext::new(&provider).ensure_owning().unwrap_err();
        assert!(matches!(err, GuardError::NotAcquired("cipher context")));
    }

    #[test]
    fn many_contexts_from_one_provider() {
        let provider = MockProvider::default();
        let contexts: Vec<_> = (0..8).map(|_| CipherContext::new(&provider)).collect();
        assert!(contexts.iter().all(CipherContext::is_owning));
        drop(contexts);
        assert_eq!(provider.allocs.get(), 8);
        assert_eq!(provider.frees.get(), 8);
    }
}
