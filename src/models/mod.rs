//! Request and response models

pub mod features;
pub mod prediction;

pub use features::*;
pub use prediction::*;
