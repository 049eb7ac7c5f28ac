pub mod client;
pub mod decode;
pub mod error;
pub mod lookup;
pub mod request;

pub use client::*;
pub use decode::*;
pub use error::*;
pub use lookup::*;
pub use request::*;
