//! Cipher context ownership
//!
//! Lifecycle ownership only; the transform itself belongs to the provider.

pub mod context;
pub mod libcrypto;
pub mod provider;

pub use context::{CipherContext, CipherState};
pub use libcrypto::LibCrypto;
pub use provider::CipherProvider;
