use serde::Serialize;

use crate::choropleth::LayerSpec;
use crate::mode::RenderMode;

/// Stable handle a drawing front end diffs layer updates by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(pub u64);

/// Something the map can draw in either render mode.
pub trait MapLayer {
    fn id(&self) -> LayerId;

    fn spec(&self, mode: RenderMode) -> LayerSpec;
}
