//! Host camera backend built on nokhwa.

pub mod native;

pub use native::{NativeDevice, NativeRegistry};
