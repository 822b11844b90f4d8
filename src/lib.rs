pub mod canvas;
pub mod color;
pub mod config;
pub mod constants;
pub mod diagram_store;
pub mod error;
pub mod families;
pub mod gene;
pub mod geometry;
pub mod highlight;
pub mod range_split;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod uniref;
pub mod viewer;

pub use gnd_protocol;

pub use canvas::SvgCanvas;
pub use color::ColorAssigner;
pub use config::GndConfig;
pub use diagram_store::DiagramStore;
pub use error::{GndError, Result};
pub use gene::{Diagram, Gene};
pub use range_split::{IndexRange, RequestRangeMap, split_request_range};
pub use session::{RetrievalParams, RetrievalSession};
pub use transport::{GndTransport, HttpTransport};
pub use viewer::{GndViewer, SearchOutcome};
