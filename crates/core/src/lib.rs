// crates/core/src/lib.rs
pub mod error;
pub mod format;
pub mod identity;
pub mod media;
pub mod quality;
pub mod sanitize;

pub use error::*;
pub use format::*;
pub use identity::*;
pub use quality::*;
pub use sanitize::*;
