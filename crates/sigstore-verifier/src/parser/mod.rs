pub mod bundle;
pub mod certificate;
pub mod identity;
pub mod sct;
pub mod timestamp;

#[cfg(feature = "rfc3161")]
pub mod rfc3161;

pub use bundle::*;
pub use certificate::*;
pub use identity::*;
pub use sct::*;
pub use timestamp::*;
