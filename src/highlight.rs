//! Family and SwissProt highlighting.
//!
//! Every drawn arrow is registered as an [`ArrowHandle`]. The index keeps
//! `family -> arrows` for Pfam and InterPro ids, `gene -> Pfam families` for arrow
//! clicks, and the set of SwissProt arrows. Highlighting flips the boolean on the
//! handles; the canvas reads it back when it builds the SVG.

use crate::gene::Gene;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Position of an arrow in the index's arena. Stable until [`HighlightIndex::reset`].
pub type ArrowId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowHandle {
    pub gene_id: String,
    /// Query gene of the diagram the arrow was drawn in.
    pub query_id: String,
    pub diagram_index: usize,
    /// Number of sub-arrow polygons that share the highlight.
    pub num_sub_arrows: usize,
    pub highlighted: bool,
}

impl ArrowHandle {
    pub fn new(gene_id: &str, query_id: &str, diagram_index: usize, num_sub_arrows: usize) -> Self {
        Self {
            gene_id: gene_id.to_string(),
            query_id: query_id.to_string(),
            diagram_index,
            num_sub_arrows,
            highlighted: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct HighlightIndex {
    arrows: Vec<ArrowHandle>,
    family_arrows: HashMap<String, BTreeSet<ArrowId>>,
    arrow_families: HashMap<String, BTreeSet<String>>,
    swissprot_arrows: BTreeSet<ArrowId>,
    filter_overlay: bool,
}

impl HighlightIndex {
    /// Drops every arrow and index; called whenever the canvas is cleared.
    pub fn reset(&mut self) {
        self.arrows = Vec::new();
        self.family_arrows = HashMap::new();
        self.arrow_families = HashMap::new();
        self.swissprot_arrows = BTreeSet::new();
        self.filter_overlay = false;
    }

    /// Records a freshly drawn arrow and the families of the gene it shows.
    pub fn register_arrow(&mut self, handle: ArrowHandle, gene: &Gene) -> ArrowId {
        let id = self.arrows.len();
        self.arrows.push(handle);

        for family in gene.family_ids() {
            self.family_arrows
                .entry(family.to_string())
                .or_default()
                .insert(id);
        }
        // Only Pfam ids take part in arrow clicks. The first arrow drawn for a gene
        // id fixes its families.
        self.arrow_families
            .entry(gene.id.clone())
            .or_insert_with(|| gene.pfam.iter().cloned().collect());

        if gene.is_swissprot {
            self.swissprot_arrows.insert(id);
        }
        id
    }

    pub fn arrow(&self, id: ArrowId) -> Option<&ArrowHandle> {
        self.arrows.get(id)
    }

    pub fn arrows(&self) -> &[ArrowHandle] {
        &self.arrows
    }

    pub fn is_highlighted(&self, id: ArrowId) -> bool {
        self.arrows.get(id).is_some_and(|a| a.highlighted)
    }

    pub fn has_family(&self, family_id: &str) -> bool {
        self.family_arrows.contains_key(family_id)
    }

    pub fn has_swissprot_arrows(&self) -> bool {
        !self.swissprot_arrows.is_empty()
    }

    pub fn family_ids_for_arrow(&self, gene_id: &str) -> Option<&BTreeSet<String>> {
        self.arrow_families.get(gene_id)
    }

    /// Additive: arrows already highlighted stay highlighted. Unknown ids are ignored.
    pub fn add_family_highlight(&mut self, family_id: &str) {
        let Some(arrows) = self.family_arrows.get(family_id) else {
            return;
        };
        let arrows: Vec<ArrowId> = arrows.iter().copied().collect();
        self.set_highlight(&arrows, true);
    }

    /// Clears the arrows of `family_id` except those that also belong to a family in
    /// `still_highlighted`.
    pub fn clear_family_highlight<'a>(
        &mut self,
        family_id: &str,
        still_highlighted: impl IntoIterator<Item = &'a str>,
    ) {
        let Some(arrows) = self.family_arrows.get(family_id) else {
            return;
        };
        let mut clear: BTreeSet<ArrowId> = arrows.clone();
        for other in still_highlighted {
            if let Some(keep) = self.family_arrows.get(other) {
                clear.retain(|id| !keep.contains(id));
            }
        }
        let clear: Vec<ArrowId> = clear.into_iter().collect();
        self.set_highlight(&clear, false);
    }

    pub fn highlight_swissprot_arrows(&mut self) {
        let arrows: Vec<ArrowId> = self.swissprot_arrows.iter().copied().collect();
        self.set_highlight(&arrows, true);
    }

    pub fn highlight_arrows_by_families<'a>(
        &mut self,
        family_ids: impl IntoIterator<Item = &'a str>,
    ) {
        let arrows: BTreeSet<ArrowId> = family_ids
            .into_iter()
            .filter_map(|f| self.family_arrows.get(f))
            .flatten()
            .copied()
            .collect();
        let arrows: Vec<ArrowId> = arrows.into_iter().collect();
        self.set_highlight(&arrows, true);
    }

    /// Clears every highlight but keeps the family indices and the overlay flag.
    pub fn remove_highlights(&mut self) {
        for arrow in &mut self.arrows {
            arrow.highlighted = false;
        }
    }

    pub fn clear_all_highlights(&mut self) {
        self.remove_highlights();
        self.disable_filter_overlay();
    }

    pub fn enable_filter_overlay(&mut self) {
        self.filter_overlay = true;
    }

    pub fn disable_filter_overlay(&mut self) {
        self.filter_overlay = false;
    }

    pub fn is_filter_overlay_enabled(&self) -> bool {
        self.filter_overlay
    }

    /// Query ids of diagrams with at least one highlighted arrow.
    pub fn highlighted_query_ids(&self) -> BTreeSet<&str> {
        self.arrows
            .iter()
            .filter(|a| a.highlighted)
            .map(|a| a.query_id.as_str())
            .collect()
    }

    /// Query ids of diagrams that contain an arrow of every family in `family_ids`.
    /// An empty family list selects nothing.
    pub fn exclusive_query_ids_for_families<'a>(
        &self,
        family_ids: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<&str> {
        let mut result: Option<BTreeSet<&str>> = None;
        for family in family_ids {
            let queries: BTreeSet<&str> = self
                .family_arrows
                .get(family)
                .into_iter()
                .flatten()
                .filter_map(|id| self.arrows.get(*id))
                .map(|a| a.query_id.as_str())
                .collect();
            result = Some(match result {
                None => queries,
                Some(acc) => acc.intersection(&queries).copied().collect(),
            });
        }
        result.unwrap_or_default()
    }

    fn set_highlight(&mut self, ids: &[ArrowId], highlighted: bool) {
        for id in ids {
            if let Some(arrow) = self.arrows.get_mut(*id) {
                arrow.highlighted = highlighted;
            }
        }
        debug!(arrows = ids.len(), highlighted, "arrow highlight changed");
    }
}

/// Family selection on top of a [`HighlightIndex`]: tracks which families the user
/// turned on and whether the SwissProt filter is on, and keeps the overlay flag in
/// step with both.
#[derive(Debug, Default)]
pub struct HighlightController {
    index: HighlightIndex,
    highlighted_families: BTreeSet<String>,
    swissprot_filter: bool,
}

impl HighlightController {
    pub fn index(&self) -> &HighlightIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut HighlightIndex {
        &mut self.index
    }

    pub fn highlighted_families(&self) -> &BTreeSet<String> {
        &self.highlighted_families
    }

    pub fn has_highlighted_families(&self) -> bool {
        !self.highlighted_families.is_empty()
    }

    pub fn is_swissprot_filter_on(&self) -> bool {
        self.swissprot_filter
    }

    /// New canvas: indices, family selection and the SwissProt filter start over.
    pub fn reset(&mut self) {
        self.index.reset();
        self.highlighted_families.clear();
        self.swissprot_filter = false;
    }

    /// Re-applies the active filter to arrows drawn after it was set: SwissProt arrows
    /// while that filter is on, otherwise the selected families.
    pub fn refresh(&mut self) {
        if self.swissprot_filter {
            if self.index.has_swissprot_arrows() {
                self.index.enable_filter_overlay();
                self.index.highlight_swissprot_arrows();
            }
        } else if self.has_highlighted_families() {
            let families = self.highlighted_families.clone();
            self.index
                .highlight_arrows_by_families(families.iter().map(String::as_str));
        }
    }

    pub fn toggle_family(&mut self, family_id: &str, show: bool) {
        if show && !self.highlighted_families.contains(family_id) {
            if self.highlighted_families.is_empty() {
                self.index.enable_filter_overlay();
            }
            self.index.add_family_highlight(family_id);
            self.highlighted_families.insert(family_id.to_string());
        } else if !show && self.highlighted_families.remove(family_id) {
            self.index.clear_family_highlight(
                family_id,
                self.highlighted_families.iter().map(String::as_str),
            );
            if self.highlighted_families.is_empty() {
                self.index.disable_filter_overlay();
            }
        }
    }

    /// Shows only SwissProt arrows, or falls back to the family selection when the
    /// filter is turned off.
    pub fn toggle_swissprots(&mut self, show: bool) {
        self.swissprot_filter = show;
        self.index.remove_highlights();
        if show && self.index.has_swissprot_arrows() {
            self.index.enable_filter_overlay();
            self.index.highlight_swissprot_arrows();
        } else if !show && self.has_highlighted_families() {
            self.index.enable_filter_overlay();
            self.refresh();
        } else {
            self.index.disable_filter_overlay();
        }
    }

    /// Ctrl/alt click on an arrow toggles all of its Pfam families together: off if any
    /// of them is on, otherwise on. Returns the families and the new state, or `None`
    /// when the arrow has no families.
    pub fn toggle_arrow_families(&mut self, gene_id: &str) -> Option<(Vec<String>, bool)> {
        let families: Vec<String> = self
            .index
            .family_ids_for_arrow(gene_id)?
            .iter()
            .cloned()
            .collect();
        let any_highlighted = families
            .iter()
            .any(|f| self.highlighted_families.contains(f));
        for family in &families {
            self.toggle_family(family, !any_highlighted);
        }
        Some((families, !any_highlighted))
    }

    pub fn clear_all_highlights(&mut self) {
        self.index.clear_all_highlights();
        self.highlighted_families.clear();
        self.swissprot_filter = false;
    }

    /// Diagrams that contain every selected family.
    pub fn highlighted_gnd_count(&self) -> usize {
        self.index
            .exclusive_query_ids_for_families(self.highlighted_families.iter().map(String::as_str))
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAssigner;
    use gnd_protocol::RawGene;
    use pretty_assertions::assert_eq;

    fn gene(id: &str, pfam: &[&str], interpro: &[&str], swissprot: bool) -> Gene {
        let raw = RawGene {
            accession: id.to_string(),
            pfam: Some(pfam.iter().map(|s| s.to_string()).collect()),
            interpro: Some(interpro.iter().map(|s| s.to_string()).collect()),
            anno_status: swissprot,
            ..Default::default()
        };
        Gene::build(&raw, &mut ColorAssigner::default(), false)
    }

    fn register(index: &mut HighlightIndex, query: &str, g: &Gene) -> ArrowId {
        index.register_arrow(ArrowHandle::new(&g.id, query, 0, 0), g)
    }

    /// A: {P1, P2}, B: {P1}, C: {P2, IPR1} (SwissProt)
    fn fixture() -> (HighlightIndex, ArrowId, ArrowId, ArrowId) {
        let mut index = HighlightIndex::default();
        let a = register(&mut index, "Q1", &gene("A", &["P1", "P2"], &[], false));
        let b = register(&mut index, "Q1", &gene("B", &["P1"], &[], false));
        let c = register(&mut index, "Q2", &gene("C", &["P2"], &["IPR1"], true));
        (index, a, b, c)
    }

    #[test]
    fn shared_arrow_keeps_highlight_until_last_family_clears() {
        let (mut index, a, b, c) = fixture();
        index.add_family_highlight("P1");
        index.add_family_highlight("P2");
        assert!(index.is_highlighted(a) && index.is_highlighted(b) && index.is_highlighted(c));

        index.clear_family_highlight("P1", ["P2"]);
        assert!(index.is_highlighted(a));
        assert!(!index.is_highlighted(b));
        assert!(index.is_highlighted(c));

        index.clear_family_highlight("P2", std::iter::empty());
        assert!(!index.is_highlighted(a));
        assert!(!index.is_highlighted(c));
    }

    #[test]
    fn unknown_family_is_a_noop() {
        let (mut index, a, _, _) = fixture();
        index.add_family_highlight("PF99999");
        index.clear_family_highlight("PF99999", ["P1"]);
        assert!(!index.is_highlighted(a));
    }

    #[test]
    fn interpro_is_indexed_for_highlighting_but_not_for_clicks() {
        let (mut index, _, _, c) = fixture();
        index.highlight_arrows_by_families(["IPR1"]);
        assert!(index.is_highlighted(c));
        let families: Vec<&str> = index
            .family_ids_for_arrow("C")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(families, vec!["P2"]);
    }

    #[test]
    fn remove_highlights_keeps_indices() {
        let (mut index, a, _, c) = fixture();
        index.highlight_swissprot_arrows();
        assert!(index.is_highlighted(c) && !index.is_highlighted(a));
        index.enable_filter_overlay();
        index.remove_highlights();
        assert!(!index.is_highlighted(c));
        assert!(index.is_filter_overlay_enabled());
        assert!(index.has_family("P1"));

        index.reset();
        assert!(!index.has_family("P1"));
        assert!(!index.has_swissprot_arrows());
        assert!(index.arrows().is_empty());
        assert!(!index.is_filter_overlay_enabled());
    }

    #[test]
    fn redrawn_gene_keeps_first_families() {
        let (mut index, ..) = fixture();
        register(&mut index, "Q3", &gene("A", &["P3"], &[], false));
        let families: Vec<&str> = index
            .family_ids_for_arrow("A")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(families, vec!["P1", "P2"]);
    }

    #[test]
    fn exclusive_query_ids_need_every_family() {
        let (index, _, _, _) = fixture();
        let both: Vec<&str> = index
            .exclusive_query_ids_for_families(["P1", "P2"])
            .into_iter()
            .collect();
        assert_eq!(both, vec!["Q1"]);
        let p2: Vec<&str> = index
            .exclusive_query_ids_for_families(["P2"])
            .into_iter()
            .collect();
        assert_eq!(p2, vec!["Q1", "Q2"]);
        assert!(index.exclusive_query_ids_for_families([]).is_empty());
    }

    fn controller() -> HighlightController {
        let (index, ..) = fixture();
        HighlightController {
            index,
            ..Default::default()
        }
    }

    #[test]
    fn toggle_family_drives_overlay() {
        let mut ctl = controller();
        ctl.toggle_family("P1", true);
        assert!(ctl.index().is_filter_overlay_enabled());
        ctl.toggle_family("P2", true);
        assert_eq!(ctl.highlighted_gnd_count(), 1);

        ctl.toggle_family("P1", false);
        assert!(ctl.index().is_filter_overlay_enabled());
        assert_eq!(ctl.highlighted_gnd_count(), 2);
        ctl.toggle_family("P2", false);
        assert!(!ctl.index().is_filter_overlay_enabled());
        assert!(ctl.index().highlighted_query_ids().is_empty());
    }

    #[test]
    fn swissprot_filter_falls_back_to_families() {
        let mut ctl = controller();
        ctl.toggle_family("P1", true);
        ctl.toggle_swissprots(true);
        let highlighted: Vec<&str> = ctl
            .index()
            .arrows()
            .iter()
            .filter(|a| a.highlighted)
            .map(|a| a.gene_id.as_str())
            .collect();
        assert_eq!(highlighted, vec!["C"]);

        ctl.toggle_swissprots(false);
        let highlighted: Vec<&str> = ctl
            .index()
            .arrows()
            .iter()
            .filter(|a| a.highlighted)
            .map(|a| a.gene_id.as_str())
            .collect();
        assert_eq!(highlighted, vec!["A", "B"]);
        assert!(ctl.index().is_filter_overlay_enabled());

        ctl.clear_all_highlights();
        ctl.toggle_swissprots(false);
        assert!(!ctl.index().is_filter_overlay_enabled());
    }

    fn highlighted_genes(ctl: &HighlightController) -> Vec<&str> {
        ctl.index()
            .arrows()
            .iter()
            .filter(|a| a.highlighted)
            .map(|a| a.gene_id.as_str())
            .collect()
    }

    #[test]
    fn swissprot_filter_survives_later_batches() {
        let mut ctl = controller();
        ctl.toggle_family("P1", true);
        ctl.toggle_swissprots(true);
        assert!(ctl.is_swissprot_filter_on());

        let index = ctl.index_mut();
        register(index, "Q3", &gene("D", &["P1"], &[], false));
        register(index, "Q3", &gene("E", &["P1"], &[], true));
        ctl.refresh();

        assert_eq!(highlighted_genes(&ctl), vec!["C", "E"]);
        assert!(ctl.index().is_filter_overlay_enabled());

        ctl.clear_all_highlights();
        assert!(!ctl.is_swissprot_filter_on());
        ctl.refresh();
        assert!(highlighted_genes(&ctl).is_empty());
    }

    #[test]
    fn arrow_click_toggles_all_families() {
        let mut ctl = controller();
        assert_eq!(
            ctl.toggle_arrow_families("A"),
            Some((vec!["P1".to_string(), "P2".to_string()], true))
        );
        assert_eq!(ctl.highlighted_families().len(), 2);

        // B shares P1, which is on, so the click turns B's families off.
        assert_eq!(
            ctl.toggle_arrow_families("B"),
            Some((vec!["P1".to_string()], false))
        );
        assert_eq!(
            ctl.highlighted_families().iter().collect::<Vec<_>>(),
            vec!["P2"]
        );
        assert_eq!(ctl.toggle_arrow_families("missing"), None);
    }
}
