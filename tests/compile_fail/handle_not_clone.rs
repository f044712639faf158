// A handle cannot be duplicated: two owners would release the value twice.
use rawguard::KernelHandle;

fn require_clone<T: Clone>() {}

fn main() {
    require_clone::<KernelHandle>();
}
