//! Contract-driven handle ownership
//!
//! [`ResourceContract`] describes a resource kind statically; [`Handle`]
//! enforces the single-owner lifecycle over it; `bindings` instantiates the
//! kernel-object, dynamic-module and process kinds.

pub mod bindings;
pub mod contract;
pub mod owned;

pub use bindings::{
    DynamicModule, KernelHandle, KernelObject, ModuleHandle, ProcessHandle, ProcessObject,
};
pub use contract::ResourceContract;
pub use owned::Handle;
