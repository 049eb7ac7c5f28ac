use std::sync::Arc;

use classify::{Classification, Palette, ScaleType, classify};
use layers::{
    ChoroplethLayer, LayerSpec, ModeTracker, PickInfo, RenderMode, Selection, TileSource, Tooltip,
};
use query::{LookupTable, QueryClient, QueryError, QueryResult, RequestTracker, Ticket};
use tracing::{debug, info, warn};
use viewstate::{ShareState, ViewStateContext, ViewStateError, Viewport};

use crate::banner::ErrorBanner;
use crate::error::SessionError;

const CHOROPLETH_LAYER_ID: u64 = 1;

/// Ties a ticket to its tracker until the response is handed back.
///
/// Dropping it unanswered (task aborted, view torn down) frees the query's
/// in-flight slot so it can be asked again.
#[derive(Debug)]
struct InFlight {
    tracker: Arc<RequestTracker>,
    ticket: Ticket,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.tracker.release(&self.ticket) {
            debug!(
                "query {:?} dropped before completion, released",
                self.ticket.query()
            );
        }
    }
}

/// A query that has been issued but not yet answered.
///
/// Running it needs no access to the session, so several can be in flight
/// while the session keeps handling input; only the newest commits.
#[derive(Debug)]
pub struct PendingQuery {
    in_flight: InFlight,
    client: QueryClient,
}

impl PendingQuery {
    pub fn query(&self) -> &str {
        self.in_flight.ticket.query()
    }

    pub async fn run(self) -> CompletedQuery {
        let result = self.client.fetch(self.in_flight.ticket.query()).await;
        CompletedQuery {
            in_flight: self.in_flight,
            result,
        }
    }
}

#[derive(Debug)]
pub struct CompletedQuery {
    in_flight: InFlight,
    result: Result<QueryResult, QueryError>,
}

/// Outcome of handing a completed query back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// The result replaced the current table.
    Applied,
    /// A newer query was issued meanwhile; the response was dropped.
    Stale,
    /// The latest query failed; the error banner is set.
    Failed(QueryError),
}

#[derive(Debug, Clone)]
struct Loaded {
    table: Arc<LookupTable>,
    generated_sql: Option<String>,
    column: String,
}

/// State behind one geomap view.
#[derive(Debug)]
pub struct GeomapSession {
    client: QueryClient,
    tracker: Arc<RequestTracker>,
    loaded: Option<Loaded>,
    scale_type: ScaleType,
    palette: Palette,
    tiles: TileSource,
    layer: Option<ChoroplethLayer>,
    modes: ModeTracker,
    selection: Selection,
    view: ViewStateContext,
    banner: Option<ErrorBanner>,
}

impl GeomapSession {
    pub fn new(client: QueryClient, view: ViewStateContext) -> Self {
        let mut modes = ModeTracker::new();
        modes.update(view.initial_viewport().zoom);
        Self {
            client,
            tracker: Arc::new(RequestTracker::new()),
            loaded: None,
            scale_type: ScaleType::default(),
            palette: Palette::default(),
            tiles: TileSource::default(),
            layer: None,
            modes,
            selection: Selection::new(),
            view,
            banner: None,
        }
    }

    pub fn with_tiles(mut self, tiles: TileSource) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn table(&self) -> Option<&Arc<LookupTable>> {
        self.loaded.as_ref().map(|l| &l.table)
    }

    pub fn column(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.column.as_str())
    }

    pub fn generated_sql(&self) -> Option<&str> {
        self.loaded.as_ref()?.generated_sql.as_deref()
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.layer.as_ref().map(ChoroplethLayer::classification)
    }

    pub fn layer(&self) -> Option<&ChoroplethLayer> {
        self.layer.as_ref()
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> &ViewStateContext {
        &self.view
    }

    pub fn render_mode(&self) -> RenderMode {
        self.modes
            .mode()
            .unwrap_or_else(|| RenderMode::for_zoom(self.view.initial_viewport().zoom))
    }

    pub fn error(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.banner = None;
    }

    /// Issues `query`, superseding anything still in flight.
    ///
    /// Returns `None` when the same query is already outstanding.
    pub fn begin_query(&mut self, query: &str) -> Option<PendingQuery> {
        let query = query.trim();
        self.view.record_query(query);
        let ticket = self.tracker.begin(query)?;
        debug!(
            "query {:?} issued as generation {}",
            query,
            ticket.generation().0
        );
        Some(PendingQuery {
            in_flight: InFlight {
                tracker: Arc::clone(&self.tracker),
                ticket,
            },
            client: self.client.clone(),
        })
    }

    /// Abandons every outstanding query; their responses will be stale.
    ///
    /// Call on teardown or when the user clears the query box.
    pub fn cancel_query(&mut self) {
        if let Some(query) = self.tracker.in_flight() {
            debug!("cancelling in-flight query {query:?}");
        }
        self.tracker.cancel();
    }

    pub fn complete(&mut self, completed: CompletedQuery) -> Commit {
        let CompletedQuery { in_flight, result } = completed;
        let ticket = &in_flight.ticket;
        let Some(result) = self.tracker.commit(ticket, result) else {
            return Commit::Stale;
        };

        match result {
            Ok(result) => {
                let Some(column) = result.table.default_column().map(str::to_string) else {
                    warn!("query {:?} returned no value columns", ticket.query());
                    let err = QueryError::decode("result has no value columns");
                    self.banner = Some(ErrorBanner::from(&err));
                    return Commit::Failed(err);
                };
                info!(
                    "query {:?} loaded {} rows, column {column:?}",
                    ticket.query(),
                    result.table.len()
                );
                self.loaded = Some(Loaded {
                    table: result.table,
                    generated_sql: result.generated_sql,
                    column,
                });
                self.banner = None;
                self.selection.clear();
                self.rebuild_layer();
                Commit::Applied
            }
            Err(err) => {
                warn!("query {:?} failed: {err}", ticket.query());
                self.banner = Some(ErrorBanner::from(&err));
                Commit::Failed(err)
            }
        }
    }

    /// Convenience for callers that do not need overlapping queries.
    pub async fn submit_query(&mut self, query: &str) -> Option<Commit> {
        let pending = self.begin_query(query)?;
        let completed = pending.run().await;
        Some(self.complete(completed))
    }

    pub fn select_column(&mut self, column: &str) -> Result<(), SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoData)?;
        if !loaded.table.contains_column(column) {
            return Err(SessionError::UnknownColumn(column.to_string()));
        }
        loaded.column = column.to_string();
        self.rebuild_layer();
        Ok(())
    }

    pub fn set_scale_type(&mut self, scale_type: ScaleType) {
        self.scale_type = scale_type;
        self.rebuild_layer();
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.rebuild_layer();
    }

    /// Called on every camera change; returns the new mode on a switch.
    pub fn on_viewport_change(&mut self, viewport: &Viewport) -> Option<RenderMode> {
        self.modes.update(viewport.zoom)
    }

    /// Called when a pan/zoom gesture ends; returns the fragment to publish.
    pub fn on_view_settled(&mut self, viewport: Viewport) -> Option<String> {
        self.modes.update(viewport.zoom);
        self.view.record_viewport(viewport);
        self.view.fragment()
    }

    /// Browser-history navigation.
    ///
    /// Restores the camera and, when the fragment names a different query,
    /// issues it.
    pub fn restore_fragment(
        &mut self,
        fragment: &str,
    ) -> Result<Option<PendingQuery>, ViewStateError> {
        let previous = self.view.query().map(str::to_string);
        let ShareState { query, zoom, .. } = self.view.restore(fragment)?;
        self.modes.update(zoom);
        if query.is_empty() || previous.as_deref() == Some(query.as_str()) {
            return Ok(None);
        }
        Ok(self.begin_query(&query))
    }

    pub fn layer_spec(&self) -> Option<LayerSpec> {
        Some(self.layer.as_ref()?.layer_spec(self.render_mode()))
    }

    pub fn hover(&mut self, pick: &PickInfo) -> bool {
        self.selection.hover(pick.identifier())
    }

    pub fn click(&mut self, pick: &PickInfo) -> Option<foundation::Zcta> {
        self.selection.click(pick.identifier())
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.layer.as_ref()?.tooltip(&self.selection)
    }

    fn rebuild_layer(&mut self) {
        let Some(loaded) = &self.loaded else {
            self.layer = None;
            return;
        };
        let values = loaded
            .table
            .column_values(&loaded.column)
            .unwrap_or_default();
        let classification = classify(&values, self.scale_type, self.palette);
        self.layer = ChoroplethLayer::new(
            CHOROPLETH_LAYER_ID,
            Arc::clone(&loaded.table),
            loaded.column.clone(),
            classification,
        )
        .map(|l| l.with_tiles(self.tiles.clone()))
        .map_err(|e| warn!("layer rebuild failed: {e}"))
        .ok();
    }
}
