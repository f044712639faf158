use std::ptr::NonNull;

/// External crypto provider exposing a matched allocate/free pair for an
/// opaque cipher context.
///
/// Contexts from one provider must only be freed by that same provider;
/// [`CipherContext`](super::CipherContext) enforces this by borrowing the
/// provider for the context's whole lifetime.
pub trait CipherProvider {
    /// Opaque provider-defined context object.
    type Context;

    /// `None` when the provider could not allocate.
    fn allocate(&self) -> Option<NonNull<Self::Context>>;

    /// # Safety
    ///
    /// `ctx` must have come from `allocate` on this provider and must not
    /// have been freed already.
    unsafe fn free(&self, ctx: NonNull<Self::Context>);
}
