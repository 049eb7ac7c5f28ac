//! Map camera state and its shareable URL-fragment encoding.

pub mod context;
pub mod share;
pub mod viewport;

pub use context::*;
pub use share::*;
pub use viewport::*;
