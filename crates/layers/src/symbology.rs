use rgb::{RGB8, RGBA8};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    /// Alpha applied to classified fill colors.
    pub fill_alpha: u8,
    /// Fill for features without a usable value.
    pub no_data: RGBA8,
    pub line: RGBA8,
    /// Fill for the selected feature.
    pub highlight: RGBA8,
}

impl LayerStyle {
    pub fn fill(&self, color: RGB8) -> RGBA8 {
        RGBA8::new(color.r, color.g, color.b, self.fill_alpha)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            fill_alpha: 200,
            no_data: RGBA8::new(0, 0, 0, 0),
            line: RGBA8::new(255, 255, 255, 80),
            highlight: RGBA8::new(255, 200, 0, 230),
        }
    }
}
