// A cipher context borrows its provider and cannot outlive it.
use rawguard::{CipherContext, CipherProvider};
use std::ptr::NonNull;

struct Exhausted;

impl CipherProvider for Exhausted {
    type Context = u8;

    fn allocate(&self) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn free(&self, _ctx: NonNull<u8>) {}
}

fn main() {
    let ctx = {
        let provider = Exhausted;
        CipherContext::new(&provider)
    };
    assert!(!ctx.is_owning());
}
