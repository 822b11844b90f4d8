use crate::lenient;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier tier of the sequences a GND database serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SequenceVersion {
    #[default]
    Uniprot,
    Uniref50,
    Uniref90,
}

impl SequenceVersion {
    /// Value sent as the `seq-ver` request parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Uniprot => "uniprot",
            Self::Uniref50 => "uniref50",
            Self::Uniref90 => "uniref90",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Uniprot => "UniProt",
            Self::Uniref50 => "UniRef50",
            Self::Uniref90 => "UniRef90",
        }
    }

    /// Anything that is not a recognized UniRef tier falls back to UniProt.
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "uniref50" => Self::Uniref50,
            "uniref90" => Self::Uniref90,
            _ => Self::Uniprot,
        }
    }
}

impl fmt::Display for SequenceVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataResponse {
    pub extent: MetadataExtent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataExtent {
    pub stats: MetadataStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataStats {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub scale_factor: Option<f64>,
    /// Closed `[start, end]` index pairs, ascending and non-overlapping.
    #[serde(default)]
    pub index_range: Vec<[i64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordResponse {
    #[serde(default)]
    pub data: Vec<RawDiagram>,
    #[serde(default)]
    pub counts: RecordCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecordCounts {
    #[serde(default)]
    pub max: usize,
}

/// One GND as served by the record endpoint: the query gene and its neighbors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawDiagram {
    pub attributes: RawGene,
    #[serde(default)]
    pub neighbors: Vec<RawGene>,
}

/// Gene fields exactly as the backend serves them. Every field is optional on the
/// wire; absent arrays stay `None` so callers can tell "missing" from "empty".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawGene {
    #[serde(default)]
    pub accession: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub organism: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub taxon_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub cluster_num: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub evalue: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub rel_start: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub rel_width: f64,
    #[serde(default)]
    pub direction: String,
    #[serde(default, deserialize_with = "lenient::reviewed_flag")]
    pub anno_status: bool,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub seq_len: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub uniref50_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub uniref90_size: Option<u64>,
    #[serde(default)]
    pub pfam: Option<Vec<String>>,
    #[serde(default)]
    pub pfam_desc: Option<Vec<String>>,
    #[serde(default)]
    pub interpro: Option<Vec<String>>,
    #[serde(default)]
    pub interpro_desc: Option<Vec<String>>,
    #[serde(default)]
    pub color: Option<Vec<String>>,
    /// Contig-end bitmask on query genes: bit 1 left, bit 2 right.
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub is_bound: u32,
}

impl RawGene {
    pub fn is_complement(&self) -> bool {
        self.direction == "complement"
    }

    pub fn pfam_ids(&self) -> &[String] {
        self.pfam.as_deref().unwrap_or_default()
    }

    pub fn interpro_ids(&self) -> &[String] {
        self.interpro.as_deref().unwrap_or_default()
    }

    pub fn supplied_colors(&self) -> &[String] {
        self.color.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn metadata_parses_index_range_pairs() {
        let json = r#"{"extent":{"stats":{"total_records":70,"scale_factor":"2.5",
            "index_range":[[0,57],[71,71],[93,102]]}}}"#;
        let md: MetadataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(md.extent.stats.total_records, 70);
        assert_eq!(md.extent.stats.scale_factor, Some(2.5));
        assert_eq!(md.extent.stats.index_range, vec![[0, 57], [71, 71], [93, 102]]);
    }

    #[test]
    fn raw_gene_accepts_strings_for_numbers() {
        let json = r#"{"accession":"P12345","rel_start":"0.25","rel_width":0.1,
            "taxon_id":562,"anno_status":"Reviewed","seq_len":"311","is_bound":3,
            "direction":"complement"}"#;
        let gene: RawGene = serde_json::from_str(json).unwrap();
        assert_eq!(gene.rel_start, 0.25);
        assert_eq!(gene.taxon_id.as_deref(), Some("562"));
        assert!(gene.anno_status);
        assert_eq!(gene.seq_len, Some(311));
        assert_eq!(gene.is_bound, 3);
        assert!(gene.is_complement());
        assert!(gene.pfam.is_none());
        assert!(gene.pfam_ids().is_empty());
    }

    #[test]
    fn record_response_defaults_missing_sections() {
        let parsed: RecordResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, RecordResponse::default());
    }

    #[test]
    fn sequence_version_round_trips_param() {
        for v in [
            SequenceVersion::Uniprot,
            SequenceVersion::Uniref50,
            SequenceVersion::Uniref90,
        ] {
            assert_eq!(SequenceVersion::from_param(v.as_param()), v);
        }
        assert_eq!(SequenceVersion::from_param("bogus"), SequenceVersion::Uniprot);
    }
}
