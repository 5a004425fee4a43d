//! Systems - logic that operates on character components

mod progression;
mod replay;

pub use progression::*;
pub use replay::*;
