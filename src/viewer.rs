//! Drives one viewer: search, batched retrieval, incremental drawing, family
//! filtering and the status text shown under the canvas.

use crate::canvas::SvgCanvas;
use crate::config::GndConfig;
use crate::constants::clamp_window_size;
use crate::diagram_store::DiagramStore;
use crate::error::{GndError, Result};
use crate::families::{FamilyCatalogue, FamilyEntry};
use crate::geometry::LayoutConstants;
use crate::highlight::HighlightController;
use crate::scheduler::{FramePump, ImmediatePump, RenderScheduler, StepResult};
use crate::session::{RetrievalParams, RetrievalSession, SessionEndpoints, SetData};
use crate::transport::GndTransport;
use crate::uniref::UnirefInfo;
use gnd_protocol::{
    ArrowClick, ArrowHover, BatchRenderComplete, FamilyChange, GndEvent, HighlightCountChanged,
    InitializeApp, NewDiagrams,
};
use tracing::{debug, info, warn};

const LOAD_ERROR_MESSAGE: &str = "Unable to load data.";
const NO_RESULTS_MESSAGE: &str = "No GNDs were identified.";
const BATCH_FINISHED_MESSAGE: &str = "No more records in batch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingMode {
    #[default]
    Idle,
    More,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The backend knows no diagrams for the query.
    Empty,
    Ready { total_records: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterMessage {
    pub text: String,
    pub is_error: bool,
}

impl FooterMessage {
    fn info(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_error: true,
        }
    }
}

pub struct GndViewer<T: GndTransport> {
    config: GndConfig,
    transport: T,
    pump: Box<dyn FramePump>,
    session: Option<RetrievalSession>,
    generation: u64,
    store: DiagramStore,
    canvas: SvgCanvas,
    highlight: HighlightController,
    scheduler: RenderScheduler,
    families: FamilyCatalogue,
    loading_mode: LoadingMode,
    canvas_ready: bool,
    total_records: u64,
    num_gnds_retrieved: usize,
    footer: Option<FooterMessage>,
    events: Vec<GndEvent>,
}

impl<T: GndTransport> GndViewer<T> {
    pub fn new(config: GndConfig, transport: T) -> Self {
        let canvas = Self::build_canvas(&config);
        Self {
            config,
            transport,
            pump: Box::new(ImmediatePump),
            session: None,
            generation: 0,
            store: DiagramStore::default(),
            canvas,
            highlight: HighlightController::default(),
            scheduler: RenderScheduler::default(),
            families: FamilyCatalogue::default(),
            loading_mode: LoadingMode::Idle,
            canvas_ready: false,
            total_records: 0,
            num_gnds_retrieved: 0,
            footer: None,
            events: vec![],
        }
    }

    /// Replaces the frame hook run between two drawn diagrams.
    pub fn with_frame_pump(mut self, pump: Box<dyn FramePump>) -> Self {
        self.pump = pump;
        self
    }

    fn build_canvas(config: &GndConfig) -> SvgCanvas {
        let constants = LayoutConstants {
            orient_query_forward: config.render.orient_query_forward,
            ..LayoutConstants::default()
        };
        let canvas = SvgCanvas::new(config.render.canvas_width, config.render.show_center_guide)
            .with_layout_constants(constants);
        match &config.render.expand_base_url {
            Some(url) => canvas.with_expand_base_url(url.clone()),
            None => canvas,
        }
    }

    /// Search parameters taken from the config: the configured UniRef cluster if any,
    /// otherwise `query`.
    pub fn params_for_query(&self, query: &str) -> RetrievalParams {
        RetrievalParams {
            query: query.to_string(),
            requested_uniref_id: self.config.sequence.uniref_id.clone(),
            requested_version: self.config.sequence.requested_version,
            window_size: self.config.retrieval.window_size,
            set_size: self.config.retrieval.set_size,
            batch_size: self.config.retrieval.batch_size,
        }
    }

    pub fn config(&self) -> &GndConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> Option<&RetrievalSession> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &DiagramStore {
        &self.store
    }

    pub fn canvas(&self) -> &SvgCanvas {
        &self.canvas
    }

    pub fn highlight(&self) -> &HighlightController {
        &self.highlight
    }

    pub fn families(&self) -> &FamilyCatalogue {
        &self.families
    }

    pub fn loading_mode(&self) -> LoadingMode {
        self.loading_mode
    }

    pub fn is_canvas_ready(&self) -> bool {
        self.canvas_ready
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn num_gnds_retrieved(&self) -> usize {
        self.num_gnds_retrieved
    }

    pub fn footer(&self) -> Option<&FooterMessage> {
        self.footer.as_ref()
    }

    /// Events emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<GndEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn svg(&self) -> svg::Document {
        self.canvas.document(self.highlight.index())
    }

    pub fn svg_string(&self) -> String {
        self.canvas.to_svg_string(self.highlight.index())
    }

    /// Starts over with a new session. Previous diagrams, highlights and family
    /// selections are dropped; family colors are kept.
    pub fn search(&mut self, params: RetrievalParams) -> Result<SearchOutcome> {
        self.generation += 1;
        self.store.reset();
        self.scheduler.reset();
        self.highlight.reset();
        self.families.clear();
        self.canvas.clear();
        self.loading_mode = LoadingMode::Idle;
        self.canvas_ready = false;
        self.total_records = 0;
        self.num_gnds_retrieved = 0;

        let endpoints = SessionEndpoints {
            metadata_url: self.config.api.metadata_url.clone(),
            record_url: self.config.api.record_url.clone(),
            job_id: self.config.job_id.clone(),
            job_key: self.config.job_key.clone(),
        };
        let uniref = UnirefInfo::from_request(
            params.requested_version,
            params
                .requested_uniref_id
                .as_deref()
                .is_some_and(|id| !id.is_empty()),
        );
        let session = self
            .session
            .insert(RetrievalSession::new(endpoints, params, self.generation));

        info!(
            generation = self.generation,
            query = %session.params().query,
            "starting GND search"
        );
        let metadata = match session.fetch_metadata(&self.transport) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "GND metadata request failed");
                self.handle_error();
                return Err(e);
            }
        };

        if metadata.total_records == 0 {
            self.footer = Some(FooterMessage::error(NO_RESULTS_MESSAGE));
            self.events.push(GndEvent::InvalidSearch);
            return Ok(SearchOutcome::Empty);
        }

        self.total_records = metadata.total_records;
        self.canvas.initialize(uniref);
        self.events.push(GndEvent::InitializeApp(InitializeApp {
            total_records: metadata.total_records,
            scale_factor: metadata.scale_factor,
            use_uniref: uniref.use_uniref,
            uniref_version: uniref.uniref_version,
            child_uniref_version: uniref.child_uniref_version,
            window_size: session.window_size(),
        }));
        Ok(SearchOutcome::Ready {
            total_records: metadata.total_records,
        })
    }

    /// Loads and draws the next batch of sets.
    pub fn show_more(&mut self) -> Result<()> {
        self.load(LoadingMode::More)
    }

    /// Loads and draws every remaining set.
    pub fn show_all(&mut self) -> Result<()> {
        self.load(LoadingMode::All)
    }

    pub fn has_more_records(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.has_more_records_to_fetch(true))
    }

    fn load(&mut self, mode: LoadingMode) -> Result<()> {
        if self.session.is_none() {
            return Err(GndError::NoActiveSearch);
        }
        if self.loading_mode != LoadingMode::Idle {
            debug!(?mode, current = ?self.loading_mode, "load ignored while loading");
            return Ok(());
        }
        let ignore_max_limit = mode == LoadingMode::All;
        self.loading_mode = mode;
        if let Some(session) = self.session.as_mut() {
            session.reset_fetch_position(ignore_max_limit);
        }

        let result = self.retrieve_and_render(ignore_max_limit);
        self.loading_mode = LoadingMode::Idle;
        result
    }

    fn retrieve_and_render(&mut self, ignore_max_limit: bool) -> Result<()> {
        loop {
            let session = self.session.as_mut().ok_or(GndError::NoActiveSearch)?;
            if !session.has_more_records_to_fetch(ignore_max_limit) {
                self.events.push(GndEvent::FinishedBatchRetrieval {
                    message: BATCH_FINISHED_MESSAGE.to_string(),
                });
                self.finalize_render();
                self.handle_success();
                return Ok(());
            }

            match session.fetch_next_set(&self.transport) {
                Ok(data) => {
                    self.render_set(data)?;
                }
                Err(e) => {
                    warn!(error = %e, "GND record request failed");
                    self.handle_error();
                    return Err(e);
                }
            }
        }
    }

    /// Stores and draws one fetched set. Sets fetched by an abandoned session are
    /// dropped and `false` is returned.
    pub fn render_set(&mut self, data: SetData) -> Result<bool> {
        if data.generation != self.generation {
            warn!(
                set_generation = data.generation,
                generation = self.generation,
                "dropping set from an abandoned search"
            );
            return Ok(false);
        }

        let diagrams = self.store.update_store(&data.raw_diagram_set);
        self.num_gnds_retrieved += data.num_diagrams;
        self.events.push(GndEvent::NewDiagrams(NewDiagrams {
            query_ids: diagrams.iter().map(|d| d.query.id.clone()).collect(),
            percent_completed: data.percent_completed,
        }));
        self.families.add_diagrams(&diagrams);

        self.canvas.clear_legend();
        self.scheduler.begin_batch(diagrams)?;
        let done = self.scheduler.run_batch(
            &mut self.canvas,
            self.highlight.index_mut(),
            self.pump.as_mut(),
        );
        if let StepResult::BatchComplete {
            batch_len,
            total_drawn,
        } = done
        {
            self.events
                .push(GndEvent::BatchRenderComplete(BatchRenderComplete {
                    batch_len,
                    total_drawn,
                }));
        }

        self.highlight.refresh();
        if self.highlight.has_highlighted_families() {
            self.emit_highlight_count();
        }
        Ok(true)
    }

    fn finalize_render(&mut self) {
        self.canvas.draw_legend(self.canvas.diagram_count());
        self.canvas_ready = true;
    }

    fn handle_success(&mut self) {
        let version = self
            .session
            .as_ref()
            .map(|s| s.params().requested_version)
            .unwrap_or_default();
        self.footer = Some(FooterMessage::info(format!(
            "Showing {} of {} {} diagrams",
            self.num_gnds_retrieved,
            self.total_records,
            version.label()
        )));
    }

    fn handle_error(&mut self) {
        self.footer = Some(FooterMessage::error(LOAD_ERROR_MESSAGE));
        self.events.push(GndEvent::RetrievalError {
            message: LOAD_ERROR_MESSAGE.to_string(),
        });
    }

    /// Re-runs the active search with a different neighborhood window and fetches as
    /// many sets as were on the canvas before. Later "show more" runs go back to the
    /// previous batch size.
    pub fn set_window_size(&mut self, window_size: u32) -> Result<SearchOutcome> {
        let window_size = clamp_window_size(window_size);
        self.config.retrieval.window_size = window_size;
        let session = self.session.as_ref().ok_or(GndError::NoActiveSearch)?;
        let mut params = session.params().clone();
        let batch_size = params.batch_size;
        let sets_retrieved = session.sets_retrieved();
        params.window_size = window_size;
        if sets_retrieved > 0 {
            params.batch_size = sets_retrieved;
        }
        debug!(window_size, sets_retrieved, "window changed, searching again");

        let outcome = self.search(params)?;
        if let SearchOutcome::Ready { .. } = outcome {
            let shown = self.show_more();
            if let Some(session) = self.session.as_mut() {
                session.set_batch_size(batch_size);
            }
            shown?;
        }
        Ok(outcome)
    }

    pub fn toggle_family(&mut self, family_id: &str, show: bool) {
        self.highlight.toggle_family(family_id, show);
        self.emit_highlight_count();
    }

    pub fn toggle_swissprots(&mut self, show: bool) {
        self.highlight.toggle_swissprots(show);
    }

    /// Replaces the selection with every family whose id or name contains `query`.
    pub fn search_families(&mut self, query: &str) -> Vec<String> {
        let matches: Vec<String> = self
            .families
            .search(query)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        self.highlight.clear_all_highlights();
        for family in &matches {
            self.highlight.toggle_family(family, true);
        }
        debug!(query, matches = matches.len(), "family search");
        self.emit_highlight_count();
        matches
    }

    pub fn clear_filter(&mut self) {
        self.highlight.clear_all_highlights();
        self.emit_highlight_count();
    }

    /// Click on an arrow. With ctrl or alt held the arrow's families are toggled.
    /// Ignored until the first batch has been drawn completely.
    pub fn arrow_click(
        &mut self,
        gene_id: &str,
        ctrl_key: bool,
        alt_key: bool,
    ) -> Option<ArrowClick> {
        if !self.canvas_ready {
            debug!(gene_id, "arrow click before canvas is ready");
            return None;
        }
        let family_change = if ctrl_key || alt_key {
            self.highlight
                .toggle_arrow_families(gene_id)
                .map(|(family_ids, highlight)| FamilyChange {
                    family_ids,
                    highlight,
                })
        } else {
            None
        };
        let click = ArrowClick {
            gene_id: gene_id.to_string(),
            ctrl_key,
            alt_key,
            family_change,
        };
        self.events.push(GndEvent::ArrowClick(click.clone()));
        if click.family_change.is_some() {
            self.emit_highlight_count();
        }
        Some(click)
    }

    pub fn arrow_hover(&mut self, gene_id: &str) -> Option<ArrowHover> {
        let anchor = self.canvas.arrow_anchor(gene_id)?;
        self.events.push(GndEvent::ArrowHover(anchor.clone()));
        Some(anchor)
    }

    pub fn arrow_hover_out(&mut self) {
        self.events.push(GndEvent::ArrowHoverOut);
    }

    pub fn highlighted_gnd_count(&self) -> usize {
        self.highlight.highlighted_gnd_count()
    }

    pub fn highlight_count_text(&self) -> String {
        format!(
            "Number of Diagrams with All Selected Families: {}",
            self.highlighted_gnd_count()
        )
    }

    /// Legend rows for the selected families.
    pub fn family_legend(&self) -> Vec<FamilyEntry> {
        self.families.legend(
            self.highlight
                .highlighted_families()
                .iter()
                .map(String::as_str),
        )
    }

    fn emit_highlight_count(&mut self) {
        self.events
            .push(GndEvent::HighlightCountChanged(HighlightCountChanged {
                num_diagrams_selected: self.highlighted_gnd_count(),
                has_highlighted_families: self.highlight.has_highlighted_families(),
            }));
    }
}
