use std::fmt;
use std::sync::Arc;

use classify::Classification;
use foundation::Zcta;
use query::{LookupTable, Value};
use rgb::RGBA8;
use serde::Serialize;

use crate::layer::{LayerId, MapLayer};
use crate::mode::{RenderMode, ZOOM_THRESHOLD};
use crate::picking::{FeatureProperties, feature_identifier};
use crate::selection::Selection;
use crate::symbology::LayerStyle;

/// Where overview tiles come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSource {
    /// `{z}/{x}/{y}` URL template.
    pub url_template: String,
    pub source_layer: String,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url_template: "/tiles/zcta/{z}/{x}/{y}.pbf".to_string(),
            source_layer: "zcta".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    UnknownColumn(String),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::UnknownColumn(c) => write!(f, "column {c:?} is not in the lookup table"),
        }
    }
}

impl std::error::Error for LayerError {}

/// One client-side polygon fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFill {
    pub zcta: Zcta,
    pub color: [u8; 4],
}

/// What the drawing front end should put on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Polygons {
        id: LayerId,
        fills: Vec<FeatureFill>,
        line: [u8; 4],
        pickable: bool,
    },
    /// Tile features are colored by looking their identifier up in `fills`,
    /// falling back to `no_data`.
    VectorTiles {
        id: LayerId,
        source: TileSource,
        min_zoom: f64,
        fills: Vec<FeatureFill>,
        no_data: [u8; 4],
        line: [u8; 4],
        pickable: bool,
    },
}

/// Tooltip contents for the active feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub zcta: Zcta,
    pub column: String,
    pub value: Option<Value>,
}

/// Binds one classified lookup-table column to the map.
///
/// Both render modes color through [`ChoroplethLayer::fill_color`], so a
/// feature keeps its color when the renderer switches at the zoom threshold.
#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    id: LayerId,
    table: Arc<LookupTable>,
    column: String,
    classification: Classification,
    style: LayerStyle,
    tiles: TileSource,
}

impl ChoroplethLayer {
    pub fn new(
        id: u64,
        table: Arc<LookupTable>,
        column: impl Into<String>,
        classification: Classification,
    ) -> Result<Self, LayerError> {
        let column = column.into();
        if !table.contains_column(&column) {
            return Err(LayerError::UnknownColumn(column));
        }
        Ok(Self {
            id: LayerId(id),
            table,
            column,
            classification,
            style: LayerStyle::default(),
            tiles: TileSource::default(),
        })
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_tiles(mut self, tiles: TileSource) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    /// Fill for a ZCTA; features absent from the table or without a numeric
    /// value get the no-data color.
    pub fn fill_color(&self, zcta: &Zcta) -> RGBA8 {
        match self
            .table
            .value(zcta, &self.column)
            .and_then(Value::as_f64)
        {
            Some(v) => self.style.fill(self.classification.color_for(Some(v))),
            None => self.style.no_data,
        }
    }

    /// Fill for a vector-tile feature, resolved through its properties.
    pub fn feature_fill(&self, properties: &FeatureProperties) -> RGBA8 {
        match feature_identifier(properties) {
            Some(zcta) => self.fill_color(&zcta),
            None => self.style.no_data,
        }
    }

    /// Fill honoring the current selection.
    pub fn fill_with_selection(&self, zcta: &Zcta, selection: &Selection) -> RGBA8 {
        if selection.is_selected(zcta) {
            self.style.highlight
        } else {
            self.fill_color(zcta)
        }
    }

    pub fn layer_spec(&self, mode: RenderMode) -> LayerSpec {
        let line = rgba(self.style.line);
        match mode {
            RenderMode::Detail => LayerSpec::Polygons {
                id: self.id,
                fills: self.fills(),
                line,
                pickable: true,
            },
            RenderMode::Overview => LayerSpec::VectorTiles {
                id: self.id,
                source: self.tiles.clone(),
                min_zoom: ZOOM_THRESHOLD,
                fills: self.fills(),
                no_data: rgba(self.style.no_data),
                line,
                pickable: true,
            },
        }
    }

    fn fills(&self) -> Vec<FeatureFill> {
        self.table
            .iter()
            .map(|(zcta, _)| FeatureFill {
                zcta: *zcta,
                color: rgba(self.fill_color(zcta)),
            })
            .collect()
    }

    pub fn tooltip(&self, selection: &Selection) -> Option<Tooltip> {
        let zcta = selection.active()?;
        Some(Tooltip {
            zcta,
            column: self.column.clone(),
            value: self.table.value(&zcta, &self.column).cloned(),
        })
    }
}

impl MapLayer for ChoroplethLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn spec(&self, mode: RenderMode) -> LayerSpec {
        self.layer_spec(mode)
    }
}

fn rgba(c: RGBA8) -> [u8; 4] {
    [c.r, c.g, c.b, c.a]
}
