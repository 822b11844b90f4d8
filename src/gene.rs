use crate::color::ColorAssigner;
use gnd_protocol::{RawDiagram, RawGene};
use serde::Serialize;

const LEFT_CONTIG_END_BIT: u32 = 1;
const RIGHT_CONTIG_END_BIT: u32 = 2;

/// One arrow of a GND. Built once from the backend record and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gene {
    pub id: String,
    pub ena_id: Option<String>,
    pub taxon_id: Option<String>,
    pub organism: Option<String>,
    pub cluster_num: Option<String>,
    pub evalue: Option<String>,
    /// Start and width in fractional diagram-width units.
    pub rel_start: f64,
    pub rel_width: f64,
    pub is_complement: bool,
    pub is_swissprot: bool,
    pub description: Option<String>,
    pub sequence_length: Option<u64>,
    pub num_uniref50_ids: u64,
    pub num_uniref90_ids: u64,
    pub pfam: Vec<String>,
    pub interpro: Vec<String>,
    pub pfam_merged: Vec<String>,
    pub interpro_merged: Vec<String>,
    /// One entry per Pfam slot, never empty.
    pub colors: Vec<String>,
    pub is_query: bool,
    pub left_contig_end: bool,
    pub right_contig_end: bool,
}

impl Gene {
    pub fn build(raw: &RawGene, colors: &mut ColorAssigner, is_query: bool) -> Self {
        let (left_contig_end, right_contig_end) = if is_query {
            (
                raw.is_bound & LEFT_CONTIG_END_BIT != 0,
                raw.is_bound & RIGHT_CONTIG_END_BIT != 0,
            )
        } else {
            (false, false)
        };

        Self {
            id: raw.accession.clone(),
            ena_id: raw.id.clone(),
            taxon_id: raw.taxon_id.clone(),
            organism: raw.organism.clone(),
            cluster_num: raw.cluster_num.clone(),
            evalue: raw.evalue.clone(),
            rel_start: raw.rel_start,
            rel_width: raw.rel_width,
            is_complement: raw.is_complement(),
            is_swissprot: raw.anno_status,
            description: raw.desc.clone(),
            sequence_length: raw.seq_len,
            num_uniref50_ids: raw.uniref50_size.unwrap_or(0),
            num_uniref90_ids: raw.uniref90_size.unwrap_or(0),
            pfam: raw.pfam_ids().to_vec(),
            interpro: raw.interpro_ids().to_vec(),
            pfam_merged: merge_family(raw.pfam.as_deref(), raw.pfam_desc.as_deref()),
            interpro_merged: merge_family(
                raw.interpro.as_deref(),
                raw.interpro_desc.as_deref(),
            ),
            colors: colors.assign(raw, is_query),
            is_query,
            left_contig_end,
            right_contig_end,
        }
    }

    /// Fill color of the base arrow polygon.
    pub fn fill_color(&self) -> &str {
        self.colors.last().map(String::as_str).unwrap_or_default()
    }

    /// Right edge in fractional units.
    pub fn rel_end(&self) -> f64 {
        self.rel_start + self.rel_width
    }

    /// All Pfam and InterPro ids, Pfam first.
    pub fn family_ids(&self) -> impl Iterator<Item = &str> {
        self.pfam.iter().chain(self.interpro.iter()).map(String::as_str)
    }
}

/// Pairs family ids with their descriptions as `"id (description)"`. Absent or
/// length-mismatched inputs give an empty list.
pub fn merge_family(ids: Option<&[String]>, descriptions: Option<&[String]>) -> Vec<String> {
    match (ids, descriptions) {
        (Some(ids), Some(descriptions)) if ids.len() == descriptions.len() => ids
            .iter()
            .zip(descriptions)
            .map(|(id, desc)| format!("{id} ({desc})"))
            .collect(),
        _ => vec![],
    }
}

/// One GND row: the query gene and its neighbors in backend order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub query: Gene,
    pub neighbors: Vec<Gene>,
}

impl Diagram {
    pub fn build(item: &RawDiagram, colors: &mut ColorAssigner) -> Self {
        let query = Gene::build(&item.attributes, colors, true);
        let neighbors = item
            .neighbors
            .iter()
            .map(|nb| Gene::build(nb, colors, false))
            .collect();
        Self { query, neighbors }
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        std::iter::once(&self.query).chain(self.neighbors.iter())
    }
}
