use std::fmt;

/// Static release policy for one kind of native resource.
///
/// A contract is never instantiated; it only names the value
/// representation, the sentinel meaning "nothing owned", and the primitive
/// that gives a value back to the system.
///
/// Implementors must guarantee that `release` is sound to call exactly once
/// on any value an acquisition returned. [`Handle`](super::Handle) never calls
/// it on `invalid()` and never calls it twice for the same acquisition.
pub trait ResourceContract {
    type Value: Copy + PartialEq + fmt::Debug;

    /// Human-readable resource kind, used in log lines.
    const KIND: &'static str;

    fn invalid() -> Self::Value;

    /// Give the value back to the system. Failures are reported by the
    /// platform backend and otherwise discarded.
    fn release(value: Self::Value);
}
