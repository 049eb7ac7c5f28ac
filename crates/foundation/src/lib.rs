pub mod geo;
pub mod precision;
pub mod zcta;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use precision::*;
pub use zcta::*;
