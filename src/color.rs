//! Color allocation for protein families.
//!
//! There are far more Pfam families than palette entries, so colors are recycled
//! round-robin. Once a family has a color it keeps it for the rest of the session.

use crate::constants::{DEFAULT_FAMILY_COLOR, FAMILY_PALETTE, QUERY_FILL_COLOR};
use gnd_protocol::RawGene;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<String>,
    family_colors: HashMap<String, String>,
    counter: usize,
    query_color: String,
    default_color: String,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::with_palette(FAMILY_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorAssigner {
    /// An empty palette falls back to the built-in one.
    pub fn with_palette(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            FAMILY_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            family_colors: HashMap::new(),
            counter: 0,
            query_color: QUERY_FILL_COLOR.to_string(),
            default_color: DEFAULT_FAMILY_COLOR.to_string(),
        }
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    pub fn query_color(&self) -> &str {
        &self.query_color
    }

    pub fn default_color(&self) -> &str {
        &self.default_color
    }

    /// Cached color for `family`, or the default color when none was assigned yet.
    pub fn get_color(&self, family: &str) -> &str {
        self.family_colors
            .get(family)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }

    /// One color per Pfam slot of `record`; never returns an empty list.
    pub fn assign(&mut self, record: &RawGene, is_query: bool) -> Vec<String> {
        let families = record.pfam_ids();
        let slots = families.len().max(1);

        if is_query {
            return vec![self.query_color.clone(); slots];
        }

        let supplied = record.supplied_colors();
        let mut colors = Vec::with_capacity(slots);
        for (i, family) in families.iter().enumerate() {
            let color = if let Some(color) = supplied.get(i) {
                // The cache takes the last supplied color, not the one for this slot.
                if let Some(last) = supplied.last() {
                    self.family_colors.insert(family.clone(), last.clone());
                }
                color.clone()
            } else if !family.is_empty() {
                self.color_for_family(family)
            } else {
                self.default_color.clone()
            };
            colors.push(color);
        }

        if colors.is_empty() {
            colors.push(self.default_color.clone());
        }
        colors
    }

    fn color_for_family(&mut self, family: &str) -> String {
        if let Some(color) = self.family_colors.get(family) {
            return color.clone();
        }
        let color = self.palette[self.counter % self.palette.len()].clone();
        self.counter += 1;
        self.family_colors.insert(family.to_string(), color.clone());
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gene(pfam: &[&str], color: Option<&[&str]>) -> RawGene {
        RawGene {
            accession: "A0A000".to_string(),
            pfam: Some(pfam.iter().map(|s| s.to_string()).collect()),
            color: color.map(|c| c.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn query_gene_always_gets_query_color() {
        let mut colors = ColorAssigner::default();
        let record = gene(&["PF00001", "PF00002"], Some(&["blue", "green"]));
        assert_eq!(colors.assign(&record, true), vec!["red", "red"]);
        assert_eq!(colors.assign(&gene(&[], None), true), vec!["red"]);
        // Query assignment never touches the family cache.
        assert_eq!(colors.get_color("PF00001"), "gray");
    }

    #[test]
    fn get_color_is_idempotent() {
        let mut colors = ColorAssigner::default();
        colors.assign(&gene(&["PF00001"], None), false);
        let first = colors.get_color("PF00001").to_string();
        assert_eq!(colors.get_color("PF00001"), first);
        assert_eq!(first, FAMILY_PALETTE[0]);
        assert_eq!(colors.get_color("PF99999"), "gray");
    }

    #[test]
    fn palette_cycles_with_its_length() {
        let mut colors = ColorAssigner::with_palette(vec!["a".into(), "b".into(), "c".into()]);
        let assigned: Vec<String> = (0..7)
            .map(|i| colors.assign(&gene(&[&format!("PF{i:05}")], None), false)[0].clone())
            .collect();
        assert_eq!(assigned, vec!["a", "b", "c", "a", "b", "c", "a"]);
        // Reusing a family does not advance the counter.
        assert_eq!(colors.assign(&gene(&["PF00001"], None), false), vec!["b"]);
        assert_eq!(colors.assign(&gene(&["PF00100"], None), false), vec!["b"]);
    }

    #[test]
    fn supplied_colors_are_cached_with_last_entry() {
        let mut colors = ColorAssigner::default();
        let record = gene(&["PF00001", "PF00002"], Some(&["blue", "green"]));
        assert_eq!(colors.assign(&record, false), vec!["blue", "green"]);
        assert_eq!(colors.get_color("PF00001"), "green");
        assert_eq!(colors.get_color("PF00002"), "green");
    }

    #[test]
    fn short_supplied_list_falls_back_to_palette() {
        let mut colors = ColorAssigner::with_palette(vec!["x".into()]);
        let record = gene(&["PF00001", "PF00002", ""], Some(&["blue"]));
        assert_eq!(colors.assign(&record, false), vec!["blue", "x", "gray"]);
    }

    #[test]
    fn gene_without_families_gets_one_default_slot() {
        let mut colors = ColorAssigner::default();
        let record = RawGene::default();
        assert_eq!(colors.assign(&record, false), vec!["gray"]);
    }
}
