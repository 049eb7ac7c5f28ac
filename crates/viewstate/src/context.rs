use tracing::{debug, warn};

use crate::share::{ShareState, ViewStateError};
use crate::viewport::Viewport;

/// Last-known view state, owned by whoever drives the map.
///
/// Written on every submitted query and every pan/zoom end, read by the map
/// on initial load and on browser-history navigation. It is a plain
/// single-owner value: pass it where it is needed rather than sharing it
/// globally.
#[derive(Debug, Clone, Default)]
pub struct ViewStateContext {
    default_viewport: Viewport,
    viewport: Option<Viewport>,
    query: Option<String>,
}

impl ViewStateContext {
    pub fn new(default_viewport: Viewport) -> Self {
        Self {
            default_viewport,
            viewport: None,
            query: None,
        }
    }

    /// Context seeded from a URL fragment.
    ///
    /// A malformed fragment is reported and leaves the context at its
    /// defaults; the error is returned alongside so callers can surface it.
    pub fn from_fragment(
        default_viewport: Viewport,
        fragment: &str,
    ) -> (Self, Option<ViewStateError>) {
        let mut ctx = Self::new(default_viewport);
        let err = ctx.restore(fragment).err();
        (ctx, err)
    }

    /// Camera to open the map with.
    pub fn initial_viewport(&self) -> Viewport {
        self.viewport.unwrap_or(self.default_viewport)
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn record_query(&mut self, query: &str) {
        debug!("view state query -> {query:?}");
        self.query = Some(query.to_string());
    }

    /// Called when a pan/zoom gesture settles. Stored normalized, so a
    /// camera panned across the antimeridian shares a valid longitude.
    pub fn record_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport.normalized());
    }

    /// Snapshot of the shareable part of the state.
    ///
    /// `None` until a query or a viewport has been recorded.
    pub fn last_state(&self) -> Option<ShareState> {
        if self.query.is_none() && self.viewport.is_none() {
            return None;
        }
        Some(ShareState::new(
            self.query.clone().unwrap_or_default(),
            &self.initial_viewport(),
        ))
    }

    /// URL fragment (with leading `#`) for the current state.
    pub fn fragment(&self) -> Option<String> {
        self.last_state().map(|s| format!("#{}", s.encode()))
    }

    /// Replaces the state with the one encoded in `fragment`.
    ///
    /// On error the context is left untouched and the error is logged and
    /// returned; nothing is silently defaulted.
    pub fn restore(&mut self, fragment: &str) -> Result<ShareState, ViewStateError> {
        match ShareState::decode(fragment) {
            Ok(state) => {
                // Keep the user's bearing/pitch, they are not part of the token.
                let current = self.initial_viewport();
                self.viewport = Some(
                    Viewport {
                        bearing: current.bearing,
                        pitch: current.pitch,
                        ..state.viewport()
                    }
                    .normalized(),
                );
                self.query = Some(state.query.clone()).filter(|q| !q.is_empty());
                Ok(state)
            }
            Err(err) => {
                warn!("ignoring malformed view state fragment {fragment:?}: {err}");
                Err(err)
            }
        }
    }
}
