use foundation::Zcta;

/// Hover and click state of the choropleth.
///
/// Clicking the already selected feature clears the selection; clicking empty
/// map also clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    hovered: Option<Zcta>,
    selected: Option<Zcta>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<Zcta> {
        self.hovered
    }

    pub fn selected(&self) -> Option<Zcta> {
        self.selected
    }

    /// Feature the tooltip should describe: the selection, else the hover.
    pub fn active(&self) -> Option<Zcta> {
        self.selected.or(self.hovered)
    }

    /// Returns `true` if the hovered feature changed.
    pub fn hover(&mut self, zcta: Option<Zcta>) -> bool {
        if self.hovered == zcta {
            return false;
        }
        self.hovered = zcta;
        true
    }

    /// Applies a click and returns the resulting selection.
    pub fn click(&mut self, zcta: Option<Zcta>) -> Option<Zcta> {
        self.selected = match (self.selected, zcta) {
            (Some(current), Some(clicked)) if current == clicked => None,
            (_, clicked) => clicked,
        };
        self.selected
    }

    pub fn is_selected(&self, zcta: &Zcta) -> bool {
        self.selected.as_ref() == Some(zcta)
    }

    pub fn clear(&mut self) {
        self.hovered = None;
        self.selected = None;
    }
}
