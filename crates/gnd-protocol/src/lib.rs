//! Machine-readable contracts shared between the GND backend, the retrieval
//! pipeline and whatever hosts the rendered canvas.
//!
//! `wire` mirrors the JSON served by the metadata and record endpoints,
//! `events` holds the typed messages the viewer emits to its host.

pub mod events;
mod lenient;
pub mod wire;

pub use events::*;
pub use wire::*;
