pub mod hash;
pub mod merkle;
pub mod signature;

pub use hash::*;
pub use merkle::*;
pub use signature::*;
