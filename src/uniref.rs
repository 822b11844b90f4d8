//! Labels and cluster sizes for UniRef searches.
//!
//! A UniRef50 database can show UniRef50 clusters, the UniRef90 members of one
//! UniRef50 cluster, or the UniProt members of one UniRef90 cluster. The
//! `(uniref_version, child_uniref_version)` pair records which of these views is
//! active.

use crate::constants::UNIPROT_TITLE;
use crate::error::{GndError, Result};
use crate::gene::Gene;
use gnd_protocol::SequenceVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnirefInfo {
    pub use_uniref: bool,
    pub uniref_version: SequenceVersion,
    pub child_uniref_version: SequenceVersion,
}

impl UnirefInfo {
    pub fn new(
        use_uniref: bool,
        uniref_version: SequenceVersion,
        child_uniref_version: SequenceVersion,
    ) -> Self {
        Self {
            use_uniref,
            uniref_version,
            child_uniref_version,
        }
    }

    /// View for a search that requested `requested` ids, either by typed query or by
    /// expanding the cluster of a UniRef id.
    pub fn from_request(requested: SequenceVersion, expands_uniref_id: bool) -> Self {
        use SequenceVersion::*;
        match (requested, expands_uniref_id) {
            (Uniprot, _) => Self::default(),
            (Uniref50, true) => Self::new(true, Uniref50, Uniref90),
            (_, true) => Self::new(false, Uniref90, Uniprot),
            (version, false) => Self::new(true, version, version),
        }
    }

    pub fn is_child_uniref(&self) -> bool {
        self.child_uniref_version != self.uniref_version
    }

    /// Type of the ids shown as diagram queries.
    pub fn id_type_name(&self) -> &'static str {
        if self.is_child_uniref() {
            self.child_uniref_version.label()
        } else {
            self.uniref_version.label()
        }
    }

    /// Type of the ids inside one query's cluster.
    pub fn id_field_name(&self) -> &'static str {
        if self.is_child_uniref() {
            SequenceVersion::Uniprot.label()
        } else {
            SequenceVersion::Uniref90.label()
        }
    }

    pub fn cluster_type_name(&self) -> &'static str {
        if self.is_child_uniref() {
            SequenceVersion::Uniref90.label()
        } else {
            self.uniref_version.label()
        }
    }

    /// UniRef90 members of a UniRef50 query, UniProt members of a UniRef90 query.
    pub fn num_ids_in_cluster(&self, query: &Gene) -> u64 {
        if self.is_child_uniref() || self.uniref_version == SequenceVersion::Uniref90 {
            query.num_uniref90_ids
        } else {
            query.num_uniref50_ids
        }
    }

    /// Clusters with a single member have nothing to expand.
    pub fn is_expandable(&self, query: &Gene) -> bool {
        self.use_uniref && self.num_ids_in_cluster(query) >= 2
    }

    pub fn cluster_subtitle(&self, query: &Gene) -> String {
        format!(
            "Number of {} IDs in {} cluster: {}",
            self.id_field_name(),
            self.cluster_type_name(),
            self.num_ids_in_cluster(query)
        )
    }

    /// `base_url` with `uniref-id` and `seq-ver` replaced so it opens the members of
    /// `query`'s cluster.
    pub fn expand_url(&self, base_url: &str, query: &Gene) -> Result<String> {
        let mut url = reqwest::Url::parse(base_url)
            .map_err(|e| GndError::InvalidUrl(format!("{base_url}: {e}")))?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "uniref-id" && k != "seq-ver")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("uniref-id", &query.id)
            .append_pair("seq-ver", self.child_uniref_version.as_param());
        Ok(url.to_string())
    }
}

/// One-line description drawn above a diagram. Parts the backend left out are skipped.
pub fn diagram_title(query: &Gene, uniref: Option<&UnirefInfo>) -> String {
    let id_type = match uniref {
        Some(info) if info.use_uniref => info.id_type_name(),
        _ => UNIPROT_TITLE,
    };

    let mut title = String::new();
    if !query.id.is_empty() {
        title.push_str(&format!("Query {id_type} ID: {}", query.id));
    }
    let parts = [
        ("", query.organism.as_deref()),
        ("NCBI Taxon ID: ", query.taxon_id.as_deref()),
        ("ENA ID: ", query.ena_id.as_deref()),
        ("Cluster: ", query.cluster_num.as_deref()),
        ("E-Value: ", query.evalue.as_deref().filter(|e| !e.is_empty())),
    ];
    for (label, value) in parts {
        if let Some(value) = value {
            title.push_str(&format!("; {label}{value}"));
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAssigner;
    use gnd_protocol::RawGene;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use SequenceVersion::*;

    fn query(uniref50: u64, uniref90: u64) -> Gene {
        let raw = RawGene {
            accession: "UniRef50_P12345".to_string(),
            organism: Some("E. coli".to_string()),
            taxon_id: Some("562".to_string()),
            uniref50_size: Some(uniref50),
            uniref90_size: Some(uniref90),
            ..Default::default()
        };
        Gene::build(&raw, &mut ColorAssigner::default(), true)
    }

    #[rstest]
    #[case(Uniprot, false, UnirefInfo::new(false, Uniprot, Uniprot))]
    #[case(Uniprot, true, UnirefInfo::new(false, Uniprot, Uniprot))]
    #[case(Uniref50, false, UnirefInfo::new(true, Uniref50, Uniref50))]
    #[case(Uniref90, false, UnirefInfo::new(true, Uniref90, Uniref90))]
    #[case(Uniref50, true, UnirefInfo::new(true, Uniref50, Uniref90))]
    #[case(Uniref90, true, UnirefInfo::new(false, Uniref90, Uniprot))]
    fn view_from_request(
        #[case] requested: SequenceVersion,
        #[case] expands: bool,
        #[case] expected: UnirefInfo,
    ) {
        assert_eq!(UnirefInfo::from_request(requested, expands), expected);
    }

    #[test]
    fn names_for_uniref50_clusters() {
        let info = UnirefInfo::from_request(Uniref50, false);
        assert_eq!(info.id_type_name(), "UniRef50");
        assert_eq!(info.id_field_name(), "UniRef90");
        assert_eq!(info.cluster_type_name(), "UniRef50");
        assert_eq!(info.num_ids_in_cluster(&query(7, 3)), 7);
        assert_eq!(
            info.cluster_subtitle(&query(7, 3)),
            "Number of UniRef90 IDs in UniRef50 cluster: 7"
        );
    }

    #[test]
    fn names_for_expanded_uniref50_cluster() {
        let info = UnirefInfo::from_request(Uniref50, true);
        assert_eq!(info.id_type_name(), "UniRef90");
        assert_eq!(info.id_field_name(), "UniProt");
        assert_eq!(info.cluster_type_name(), "UniRef90");
        assert_eq!(info.num_ids_in_cluster(&query(7, 3)), 3);
        assert!(info.is_expandable(&query(7, 3)));
        assert!(!info.is_expandable(&query(7, 1)));
    }

    #[test]
    fn expand_url_replaces_cluster_params() {
        let info = UnirefInfo::from_request(Uniref50, false);
        let url = info
            .expand_url(
                "https://efi.example.org/gnd?id=5&uniref-id=old&seq-ver=uniref90",
                &query(7, 3),
            )
            .unwrap();
        assert_eq!(
            url,
            "https://efi.example.org/gnd?id=5&uniref-id=UniRef50_P12345&seq-ver=uniref50"
        );
        assert!(matches!(
            info.expand_url("not a url", &query(1, 1)),
            Err(GndError::InvalidUrl(_))
        ));
    }

    #[test]
    fn title_skips_missing_parts() {
        let gene = query(1, 1);
        assert_eq!(
            diagram_title(&gene, None),
            "Query UniProt ID: UniRef50_P12345; E. coli; NCBI Taxon ID: 562"
        );
        let info = UnirefInfo::from_request(Uniref50, false);
        assert!(diagram_title(&gene, Some(&info)).starts_with("Query UniRef50 ID: "));
    }
}
