use crate::wire::SequenceVersion;
use serde::{Deserialize, Serialize};

/// Messages the viewer emits to its host. Each kind carries its own payload
/// shape; serialized form is tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GndEvent {
    InitializeApp(InitializeApp),
    NewDiagrams(NewDiagrams),
    BatchRenderComplete(BatchRenderComplete),
    FinishedBatchRetrieval { message: String },
    InvalidSearch,
    RetrievalError { message: String },
    HighlightCountChanged(HighlightCountChanged),
    ArrowClick(ArrowClick),
    ArrowHover(ArrowHover),
    ArrowHoverOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeApp {
    pub total_records: u64,
    pub scale_factor: Option<f64>,
    pub use_uniref: bool,
    pub uniref_version: SequenceVersion,
    pub child_uniref_version: SequenceVersion,
    pub window_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDiagrams {
    /// Query gene ids of the diagrams in the set, in draw order.
    pub query_ids: Vec<String>,
    pub percent_completed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRenderComplete {
    pub batch_len: usize,
    pub total_drawn: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightCountChanged {
    pub num_diagrams_selected: usize,
    pub has_highlighted_families: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowClick {
    pub gene_id: String,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub family_change: Option<FamilyChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyChange {
    pub family_ids: Vec<String>,
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowHover {
    pub gene_id: String,
    /// Popup anchor in canvas units: arrow center and the diagram's vertical span.
    pub x: f64,
    pub gnd_lower_y: f64,
    pub gnd_upper_y: f64,
}
