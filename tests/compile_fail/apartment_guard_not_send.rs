// An apartment guard must be dropped on the thread that initialized it.
use rawguard::ApartmentGuard;

fn require_send<T: Send>() {}

fn main() {
    require_send::<ApartmentGuard>();
}
