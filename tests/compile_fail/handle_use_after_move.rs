// A moved-from binding cannot be used again.
use rawguard::KernelHandle;

fn main() {
    let handle = KernelHandle::new();
    let _moved = handle;
    let _valid = handle.is_valid();
}
