//! Generic single-owner container for a contract-described native value.
//!
//! Every mutating operation leaves exactly one owner holding a valid value:
//! moves and [`Handle::take`] swap the invalid sentinel into the source,
//! [`Handle::reset`] swaps before releasing, and `Drop` is `clear()`.

use super::contract::ResourceContract;
use crate::config::types::{GuardError, Result};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};

/// Move-only owner of one native value bound to contract `C`.
///
/// ```
/// use rawguard::KernelHandle;
///
/// let mut source = KernelHandle::new();
/// let dest = source.take();
/// assert!(!source.is_valid() && !dest.is_valid());
/// ```
///
/// Not `Clone`: duplicating the value would release it twice. Each binding
/// is its own type, so a process handle is never accepted where a
/// kernel-object handle is expected.
pub struct Handle<C: ResourceContract> {
    value: C::Value,
    _contract: PhantomData<fn() -> C>,
}

impl<C: ResourceContract> Handle<C> {
    /// Empty handle holding `C::invalid()`. No side effect.
    pub fn new() -> Self {
        Self::from_raw(C::invalid())
    }

    /// Adopt `value` unconditionally. Passing the sentinel yields an empty handle.
    pub fn from_raw(value: C::Value) -> Self {
        Self {
            value,
            _contract: PhantomData,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value != C::invalid()
    }

    /// Held value, ownership stays with the handle.
    pub fn get(&self) -> C::Value {
        self.value
    }

    /// Release the current value (if valid) and adopt `value`.
    ///
    /// Resetting to the value already held is a no-op.
    pub fn reset(&mut self, value: C::Value) {
        if value == self.value {
            return;
        }
        let old = mem::replace(&mut self.value, value);
        if old != C::invalid() {
            log::debug!("releasing {} {:?}", C::KIND, old);
            C::release(old);
        }
    }

    /// Release the current value (if valid), leaving the handle empty.
    pub fn clear(&mut self) {
        self.reset(C::invalid());
    }

    /// Move ownership into a new handle, leaving this one empty.
    pub fn take(&mut self) -> Self {
        Self::from_raw(mem::replace(&mut self.value, C::invalid()))
    }

    /// Give up ownership without releasing. The caller now owns the value.
    pub fn into_raw(self) -> C::Value {
        let this = ManuallyDrop::new(self);
        this.value
    }

    /// `Ok(self)` when valid, otherwise `GuardError::NotAcquired`.
    pub fn ensure_valid(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(GuardError::NotAcquired(C::KIND))
        }
    }
}

impl<C: ResourceContract> Default for Handle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ResourceContract> Drop for Handle<C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<C: ResourceContract> fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &C::KIND)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    thread_local! {
        static RELEASED: RefCell<HashMap<u32, usize>> = RefCell::new(HashMap::new());
    }

    struct Counted;

    impl ResourceContract for Counted {
        type Value = u32;
        const KIND: &'static str = "counted";

        fn invalid() -> u32 {
            0
        }

        fn release(value: u32) {
            assert_ne!(value, 0, "release called on sentinel");
            RELEASED.with(|r| *r.borrow_mut().entry(value).or_insert(0) += 1);
        }
    }

    fn releases(value: u32) -> usize {
        RELEASED.with(|r| r.borrow().get(&value).copied().unwrap_or(0))
    }

    fn total_releases() -> usize {
        RELEASED.with(|r| r.borrow().values().sum())
    }

    #[test]
    fn empty_handle_never_releases() {
        {
            let handle = Handle::<Counted>::new();
            assert!(!handle.is_valid());
            let default = Handle::<Counted>::default();
            assert!(!default.is_valid());
        }
        assert_eq!(total_releases(), 0);
    }

    #[test]
    fn from_sentinel_is_empty() {
        {
            let handle = Handle::<Counted>::from_raw(0);
            assert!(!handle.is_valid());
        }
        assert_eq!(total_releases(), 0);
    }

    #[test]
    fn drop_releases_exactly_once() {
        {
            let handle = Handle::<Counted>::from_raw(0x1234);
            assert!(handle.is_valid());
            assert_eq!(handle.get(), 0x1234);
        }
        assert_eq!(releases(0x1234), 1);
        assert_eq!(total_releases(), 1);
    }

    #[test]
    fn take_moves_ownership() {
        {
            let mut source = Handle::<Counted>::from_raw(7);
            let dest = source.take();
            assert!(!source.is_valid());
            assert!(dest.is_valid());
            assert_eq!(dest.get(), 7);
            assert_eq!(releases(7), 0);
        }
        assert_eq!(releases(7), 1);
    }

    #[test]
    fn language_move_releases_once() {
        {
            let first = Handle::<Counted>::from_raw(8);
            let second = first;
            assert_eq!(second.get(), 8);
        }
        assert_eq!(releases(8), 1);
    }

    #[test]
    fn move_assign_releases_previous_destination() {
        let mut dest = Handle::<Counted>::from_raw(10);
        let mut source = Handle::<Counted>::from_raw(11);
        assert_eq!(dest.get(), 10);
        dest = source.take();
        assert_eq!(releases(10), 1);
        assert_eq!(dest.get(), 11);
        assert!(!source.is_valid());
        drop(dest);
        drop(source);
        assert_eq!(releases(11), 1);
        assert_eq!(total_releases(), 2);
    }

    #[test]
    fn reset_releases_old_then_adopts_new() {
        let mut handle = Handle::<Counted>::from_raw(21);
        handle.reset(22);
        assert_eq!(releases(21), 1);
        assert_eq!(releases(22), 0);
        assert_eq!(handle.get(), 22);
        drop(handle);
        assert_eq!(releases(22), 1);
    }

    #[test]
    fn reset_on_empty_does_not_release() {
        let mut handle = Handle::<Counted>::new();
        handle.reset(30);
        assert_eq!(total_releases(), 0);
        assert!(handle.is_valid());
    }

    #[test]
    fn reset_to_held_value_is_noop() {
        let mut handle = Handle::<Counted>::from_raw(40);
        handle.reset(40);
        assert_eq!(releases(40), 0);
        assert_eq!(handle.get(), 40);
        drop(handle);
        assert_eq!(releases(40), 1);
    }

    #[test]
    fn repeated_clear_releases_once() {
        let mut handle = Handle::<Counted>::from_raw(50);
        handle.clear();
        handle.clear();
        assert!(!handle.is_valid());
        drop(handle);
        assert_eq!(releases(50), 1);
    }

    #[test]
    fn into_raw_relinquishes_without_release() {
        let handle = Handle::<Counted>::from_raw(60);
        assert_eq!(handle.into_raw(), 60);
        assert_eq!(releases(60), 0);

        // Re-adopting the value makes it owned again.
        drop(Handle::<Counted>::from_raw(60));
        assert_eq!(releases(60), 1);
    }

    #[test]
    fn ensure_valid_reports_kind() {
        let err = Handle::<Counted>::new().ensure_valid().unwrap_err();
        assert!(matches!(err, GuardError::NotAcquired("counted")));

        let handle = Handle::<Counted>::from_raw(70).ensure_valid().unwrap();
        assert_eq!(handle.get(), 70);
    }

    #[test]
    fn partial_construction_releases_acquired_part() {
        struct Pair {
            _first: Handle<Counted>,
            _second: Handle<Counted>,
        }

        fn build(fail: bool) -> std::result::Result<Pair, &'static str> {
            let first = Handle::<Counted>::from_raw(80);
            if fail {
                return Err("second acquisition failed");
            }
            Ok(Pair {
                _first: first,
                _second: Handle::from_raw(81),
            })
        }

        assert!(build(true).is_err());
        assert_eq!(releases(80), 1);
        assert_eq!(releases(81), 0);
    }

    #[test]
    fn debug_names_kind() {
        let handle = Handle::<Counted>::from_raw(90);
        let rendered = format!("{:?}", handle);
        assert!(rendered.contains("counted"));
        assert!(rendered.contains("90"));
    }
}
