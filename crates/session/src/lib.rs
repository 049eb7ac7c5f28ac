//! Geomap session: wires the query fetcher, classifier, renderer and view
//! state together the way the map UI drives them.

pub mod banner;
pub mod error;
pub mod session;

pub use banner::*;
pub use error::*;
pub use session::*;
