pub mod choropleth;
pub mod layer;
pub mod mode;
pub mod picking;
pub mod selection;
pub mod symbology;

pub use choropleth::*;
pub use layer::*;
pub use mode::*;
pub use picking::*;
pub use selection::*;
pub use symbology::*;
