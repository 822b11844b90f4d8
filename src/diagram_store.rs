use crate::color::ColorAssigner;
use crate::error::Result;
use crate::gene::{Diagram, Gene};
use gnd_protocol::RecordResponse;
use std::collections::HashMap;
use tracing::debug;

/// Gene index for the diagrams of one user query. Entries are only ever added or
/// replaced; a new search calls [`DiagramStore::reset`].
#[derive(Debug, Default)]
pub struct DiagramStore {
    colors: ColorAssigner,
    genes: HashMap<String, Gene>,
}

impl DiagramStore {
    pub fn new(colors: ColorAssigner) -> Self {
        Self {
            colors,
            genes: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.genes.clear();
    }

    pub fn colors(&self) -> &ColorAssigner {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Builds diagrams for every record in `json` and indexes their genes by id.
    /// A gene id seen before is overwritten. Rendering is left to the caller.
    pub fn update_store(&mut self, json: &RecordResponse) -> Vec<Diagram> {
        let diagrams: Vec<Diagram> = json
            .data
            .iter()
            .map(|item| Diagram::build(item, &mut self.colors))
            .collect();

        for diagram in &diagrams {
            if !diagram.query.id.is_empty() {
                self.genes
                    .insert(diagram.query.id.clone(), diagram.query.clone());
            }
            for nb in &diagram.neighbors {
                self.genes.insert(nb.id.clone(), nb.clone());
            }
        }
        debug!(
            new_diagrams = diagrams.len(),
            indexed_genes = self.genes.len(),
            "diagram store updated"
        );
        diagrams
    }

    /// Same as [`DiagramStore::update_store`] for a payload that is still raw JSON.
    pub fn update_store_from_value(&mut self, json: serde_json::Value) -> Result<Vec<Diagram>> {
        let parsed: RecordResponse = serde_json::from_value(json)?;
        Ok(self.update_store(&parsed))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Gene> {
        self.genes.get(id)
    }
}
