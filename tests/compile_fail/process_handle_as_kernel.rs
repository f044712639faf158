// Process handles and kernel-object handles are distinct types.
use rawguard::{KernelHandle, ProcessHandle};

fn adopt(_handle: KernelHandle) {}

fn main() {
    adopt(ProcessHandle::new());
}
