use crate::gene::{Diagram, Gene};
use serde::Serialize;
use std::collections::BTreeMap;

const PFAM_PREFIX: &str = "PF";
const INTERPRO_PREFIX: &str = "IPR";
const TRANSPARENT: &str = "#00000000";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyEntry {
    pub id: String,
    /// `"id (description)"` when the backend sent descriptions, otherwise the id.
    pub name: String,
    /// Slot color for Pfam families; InterPro families are not colored.
    pub color: Option<String>,
}

impl FamilyEntry {
    pub fn is_pfam(&self) -> bool {
        self.id.starts_with(PFAM_PREFIX)
    }

    pub fn is_interpro(&self) -> bool {
        self.id.starts_with(INTERPRO_PREFIX)
    }

    /// Swatch color for a legend, transparent for uncolored families.
    pub fn legend_color(&self) -> &str {
        self.color
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(TRANSPARENT)
    }
}

/// Every family seen in the drawn diagrams, keyed by upper-cased id.
#[derive(Debug, Clone, Default)]
pub struct FamilyCatalogue {
    entries: BTreeMap<String, FamilyEntry>,
}

impl FamilyCatalogue {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, family_id: &str) -> Option<&FamilyEntry> {
        self.entries.get(&family_id.to_uppercase())
    }

    pub fn add_diagrams<'a>(&mut self, diagrams: impl IntoIterator<Item = &'a Diagram>) {
        for diagram in diagrams {
            for gene in diagram.genes() {
                self.add_gene(gene);
            }
        }
    }

    /// Later genes overwrite the name and color of a family seen before.
    pub fn add_gene(&mut self, gene: &Gene) {
        for (i, family) in gene.pfam.iter().enumerate() {
            self.insert(family, gene.pfam_merged.get(i), gene.colors.get(i).cloned());
        }
        for (i, family) in gene.interpro.iter().enumerate() {
            self.insert(family, gene.interpro_merged.get(i), None);
        }
    }

    fn insert(&mut self, family: &str, merged: Option<&String>, color: Option<String>) {
        if family.is_empty() {
            return;
        }
        let id = family.to_uppercase();
        let name = merged.cloned().unwrap_or_else(|| id.clone());
        self.entries.insert(id.clone(), FamilyEntry { id, name, color });
    }

    pub fn pfam_families(&self) -> impl Iterator<Item = &FamilyEntry> {
        self.entries.values().filter(|e| e.is_pfam())
    }

    pub fn interpro_families(&self) -> impl Iterator<Item = &FamilyEntry> {
        self.entries.values().filter(|e| e.is_interpro())
    }

    /// Case-insensitive substring match on id or name. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&FamilyEntry> {
        let query = query.trim().to_uppercase();
        if query.is_empty() {
            return vec![];
        }
        self.entries
            .values()
            .filter(|e| e.id.contains(&query) || e.name.to_uppercase().contains(&query))
            .collect()
    }

    /// Legend rows for the selected families, sorted by id. Unknown ids fall back to
    /// the id as name.
    pub fn legend<'a>(&self, family_ids: impl IntoIterator<Item = &'a str>) -> Vec<FamilyEntry> {
        let mut rows: Vec<FamilyEntry> = family_ids
            .into_iter()
            .map(|id| {
                self.get(id).cloned().unwrap_or_else(|| FamilyEntry {
                    id: id.to_string(),
                    name: id.to_string(),
                    color: None,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}
