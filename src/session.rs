//! Two-phase retrieval of the diagrams for one search: a metadata request that
//! describes which diagram indices exist, then ranged record requests one block at a
//! time.
//!
//! Terminology:
//! * record: one GND row
//! * set: the records fetched by a single request (`set_size`, usually 20)
//! * batch: the sets fetched by one "show more" (`batch_size` sets, usually 10)

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SET_SIZE, DEFAULT_WINDOW_SIZE, UNSPECIFIED};
use crate::error::{GndError, Result};
use crate::range_split::{RequestRangeMap, format_range_param, split_request_range};
use crate::transport::{GndTransport, QueryParams};
use gnd_protocol::{MetadataResponse, RecordResponse, SequenceVersion};
use tracing::{debug, info};

/// What the user searched for and how the results should be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalParams {
    pub query: String,
    /// Set when the user expanded a UniRef cluster instead of typing a query.
    pub requested_uniref_id: Option<String>,
    pub requested_version: SequenceVersion,
    pub window_size: u32,
    pub set_size: usize,
    pub batch_size: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            requested_uniref_id: None,
            requested_version: SequenceVersion::Uniprot,
            window_size: DEFAULT_WINDOW_SIZE,
            set_size: DEFAULT_SET_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Where the session sends its requests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionEndpoints {
    pub metadata_url: String,
    pub record_url: String,
    pub job_id: String,
    pub job_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataSummary {
    pub total_records: u64,
    pub scale_factor: Option<f64>,
}

/// One fetched set together with the progress of the batch it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SetData {
    pub raw_diagram_set: RecordResponse,
    pub percent_completed: f64,
    pub num_diagrams: usize,
    /// Generation of the session that fetched this set.
    pub generation: u64,
}

#[derive(Debug)]
pub struct RetrievalSession {
    endpoints: SessionEndpoints,
    params: RetrievalParams,
    generation: u64,
    scale_factor: Option<f64>,
    current_position: usize,
    start_position: usize,
    end_position: usize,
    sets_retrieved: usize,
    request_ranges: RequestRangeMap,
}

impl RetrievalSession {
    pub fn new(endpoints: SessionEndpoints, params: RetrievalParams, generation: u64) -> Self {
        let mut session = Self {
            endpoints,
            params,
            generation,
            scale_factor: None,
            current_position: 0,
            start_position: 0,
            end_position: 0,
            sets_retrieved: 0,
            request_ranges: RequestRangeMap::default(),
        };
        session.reset_fetch_position(false);
        session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    pub fn window_size(&self) -> u32 {
        self.params.window_size
    }

    pub fn scale_factor(&self) -> Option<f64> {
        self.scale_factor
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    pub fn request_ranges(&self) -> &RequestRangeMap {
        &self.request_ranges
    }

    /// Sets fetched successfully since the metadata request.
    pub fn sets_retrieved(&self) -> usize {
        self.sets_retrieved
    }

    /// Takes effect with the next `reset_fetch_position`.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.params.batch_size = batch_size;
    }

    /// Takes effect with the next request.
    pub fn set_window_size(&mut self, window_size: u32) {
        self.params.window_size = window_size;
    }

    /// Marks the start of a "show more" (`ignore_max_limit == false`) or "show all" run
    /// so progress is measured against that run only.
    pub fn reset_fetch_position(&mut self, ignore_max_limit: bool) {
        let blocks = self.request_ranges.len();
        self.start_position = self.current_position;
        self.end_position = if ignore_max_limit {
            blocks
        } else {
            (self.current_position + self.params.batch_size).min(blocks)
        };
    }

    pub fn fetch_metadata(&mut self, transport: &dyn GndTransport) -> Result<MetadataSummary> {
        let mut params = self.base_params();
        params.push(("window".to_string(), self.params.window_size.to_string()));
        self.push_query_param(&mut params);
        self.push_version_param(&mut params);

        info!(url = %self.endpoints.metadata_url, "fetching GND metadata");
        let value = transport.get_json(&self.endpoints.metadata_url, &params)?;
        let metadata: MetadataResponse = serde_json::from_value(value)?;
        let stats = metadata.extent.stats;

        self.scale_factor = stats.scale_factor;
        self.request_ranges = split_request_range(&stats.index_range, self.params.set_size)?;
        debug!(
            total_records = stats.total_records,
            blocks = self.request_ranges.len(),
            "metadata received"
        );

        Ok(MetadataSummary {
            total_records: stats.total_records,
            scale_factor: self.scale_factor,
        })
    }

    /// Fetches the block at the current position. The position is advanced before the
    /// request goes out, so a failed block is skipped on the next call.
    pub fn fetch_next_set(&mut self, transport: &dyn GndTransport) -> Result<SetData> {
        let range = self
            .request_ranges
            .get(self.current_position)
            .map(format_range_param)
            .ok_or(GndError::Exhausted)?;
        self.current_position += 1;

        let mut params = self.base_params();
        self.push_query_param(&mut params);
        params.push(("range".to_string(), range));
        if let Some(scale_factor) = self.scale_factor.filter(|sf| *sf != 0.0) {
            params.push(("scale-factor".to_string(), scale_factor.to_string()));
        }
        if self.params.window_size != UNSPECIFIED {
            params.push(("window".to_string(), self.params.window_size.to_string()));
        }
        self.push_version_param(&mut params);

        debug!(position = self.current_position - 1, "fetching GND set");
        let value = transport.get_json(&self.endpoints.record_url, &params)?;
        let response: RecordResponse = serde_json::from_value(value)?;
        self.sets_retrieved += 1;

        let num_diagrams = response.counts.max;
        Ok(SetData {
            raw_diagram_set: response,
            percent_completed: self.percent_completed(),
            num_diagrams,
            generation: self.generation,
        })
    }

    pub fn has_more_records_to_fetch(&self, ignore_max_limit: bool) -> bool {
        let has_remaining = self.current_position < self.request_ranges.len();
        if ignore_max_limit {
            has_remaining
        } else {
            has_remaining && self.current_position < self.end_position
        }
    }

    /// Progress of the current run in percent.
    pub fn percent_completed(&self) -> f64 {
        let span = self.end_position.saturating_sub(self.start_position);
        if span == 0 {
            return 0.0;
        }
        let done = self.current_position.saturating_sub(self.start_position);
        100.0 * done as f64 / span as f64
    }

    fn base_params(&self) -> QueryParams {
        vec![
            ("id".to_string(), self.endpoints.job_id.clone()),
            ("key".to_string(), self.endpoints.job_key.clone()),
        ]
    }

    fn push_query_param(&self, params: &mut QueryParams) {
        match self.params.requested_uniref_id.as_deref().filter(|id| !id.is_empty()) {
            Some(uniref_id) => params.push(("uniref-id".to_string(), uniref_id.to_string())),
            None => params.push(("query".to_string(), self.params.query.clone())),
        }
    }

    fn push_version_param(&self, params: &mut QueryParams) {
        if self.params.requested_version != SequenceVersion::Uniprot {
            params.push((
                "seq-ver".to_string(),
                self.params.requested_version.as_param().to_string(),
            ));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers requests from a queue and records what was asked.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub responses: RefCell<VecDeque<Result<Value>>>,
        pub requests: RefCell<Vec<(String, QueryParams)>>,
    }

    impl ScriptedTransport {
        pub fn push(&self, response: Result<Value>) {
            self.responses.borrow_mut().push_back(response);
        }

        pub fn param(&self, request: usize, name: &str) -> Option<String> {
            self.requests.borrow()[request]
                .1
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    impl GndTransport for ScriptedTransport {
        fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), params.to_vec()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(GndError::Network {
                    url: url.to_string(),
                    status: 404,
                }))
        }
    }

    fn endpoints() -> SessionEndpoints {
        SessionEndpoints {
            metadata_url: "http://gnd/meta".to_string(),
            record_url: "http://gnd/record".to_string(),
            job_id: "42".to_string(),
            job_key: "secret".to_string(),
        }
    }

    fn metadata(index_range: Value) -> Value {
        json!({"extent": {"stats": {
            "total_records": 69, "scale_factor": 2.5, "index_range": index_range
        }}})
    }

    fn records(n: usize) -> Value {
        let data: Vec<Value> = (0..n)
            .map(|i| json!({"attributes": {"accession": format!("Q{i}")}, "neighbors": []}))
            .collect();
        json!({"data": data, "counts": {"max": n}})
    }

    #[test]
    fn metadata_request_and_block_map() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(metadata(json!([[0, 57], [71, 71], [93, 102]]))));
        let mut session = RetrievalSession::new(
            endpoints(),
            RetrievalParams {
                query: "7".to_string(),
                ..Default::default()
            },
            1,
        );

        let summary = session.fetch_metadata(&transport).unwrap();
        assert_eq!(summary.total_records, 69);
        assert_eq!(summary.scale_factor, Some(2.5));
        assert_eq!(session.request_ranges().len(), 4);

        let requests = transport.requests.borrow();
        assert_eq!(requests[0].0, "http://gnd/meta");
        assert_eq!(
            requests[0].1,
            vec![
                ("id".to_string(), "42".to_string()),
                ("key".to_string(), "secret".to_string()),
                ("window".to_string(), "10".to_string()),
                ("query".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn uniref_id_and_version_are_sent() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(metadata(json!([[0, 4]]))));
        transport.push(Ok(records(5)));
        let mut session = RetrievalSession::new(
            endpoints(),
            RetrievalParams {
                query: "ignored".to_string(),
                requested_uniref_id: Some("UniRef50_P1".to_string()),
                requested_version: SequenceVersion::Uniref50,
                ..Default::default()
            },
            1,
        );
        session.fetch_metadata(&transport).unwrap();
        session.reset_fetch_position(false);
        session.fetch_next_set(&transport).unwrap();

        for request in 0..2 {
            assert_eq!(transport.param(request, "uniref-id").as_deref(), Some("UniRef50_P1"));
            assert_eq!(transport.param(request, "query"), None);
            assert_eq!(transport.param(request, "seq-ver").as_deref(), Some("uniref50"));
        }
        assert_eq!(transport.param(1, "range").as_deref(), Some("0-4"));
        assert_eq!(transport.param(1, "scale-factor").as_deref(), Some("2.5"));
    }

    #[test]
    fn batch_progress_and_limits() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(metadata(json!([[0, 99]]))));
        let mut session = RetrievalSession::new(
            endpoints(),
            RetrievalParams {
                set_size: 10,
                batch_size: 4,
                ..Default::default()
            },
            1,
        );
        session.fetch_metadata(&transport).unwrap();
        session.reset_fetch_position(false);

        let mut percents = vec![];
        while session.has_more_records_to_fetch(false) {
            transport.push(Ok(records(10)));
            percents.push(session.fetch_next_set(&transport).unwrap().percent_completed);
        }
        assert_eq!(percents, vec![25.0, 50.0, 75.0, 100.0]);
        assert!(session.has_more_records_to_fetch(true));

        session.reset_fetch_position(true);
        let mut fetched = 0;
        while session.has_more_records_to_fetch(true) {
            transport.push(Ok(records(10)));
            let set = session.fetch_next_set(&transport).unwrap();
            fetched += 1;
            assert_eq!(set.num_diagrams, 10);
        }
        assert_eq!(fetched, 6);
        assert_eq!(transport.param(10, "range").as_deref(), Some("90-99"));
        assert_eq!(session.percent_completed(), 100.0);
    }

    #[test]
    fn failed_block_is_skipped() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(metadata(json!([[0, 39]]))));
        let mut session = RetrievalSession::new(endpoints(), RetrievalParams::default(), 1);
        session.fetch_metadata(&transport).unwrap();
        session.reset_fetch_position(false);

        transport.push(Err(GndError::Network {
            url: "http://gnd/record".to_string(),
            status: 500,
        }));
        assert!(matches!(
            session.fetch_next_set(&transport),
            Err(GndError::Network { status: 500, .. })
        ));
        assert_eq!(session.current_position(), 1);
        assert_eq!(session.sets_retrieved(), 0);

        transport.push(Ok(records(20)));
        session.fetch_next_set(&transport).unwrap();
        assert_eq!(transport.param(2, "range").as_deref(), Some("20-39"));
        assert_eq!(session.sets_retrieved(), 1);
    }

    #[test]
    fn exhausted_session_does_not_advance() {
        let mut session = RetrievalSession::new(endpoints(), RetrievalParams::default(), 1);
        let transport = ScriptedTransport::default();
        assert!(!session.has_more_records_to_fetch(true));
        assert!(matches!(
            session.fetch_next_set(&transport),
            Err(GndError::Exhausted)
        ));
        assert_eq!(session.current_position(), 0);
        assert!(transport.requests.borrow().is_empty());
        assert_eq!(session.percent_completed(), 0.0);
    }

    #[test]
    fn window_change_applies_to_next_request() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(metadata(json!([[0, 5]]))));
        transport.push(Ok(records(6)));
        let mut session = RetrievalSession::new(endpoints(), RetrievalParams::default(), 1);
        session.fetch_metadata(&transport).unwrap();
        session.set_window_size(15);
        session.reset_fetch_position(false);
        session.fetch_next_set(&transport).unwrap();
        assert_eq!(transport.param(0, "window").as_deref(), Some("10"));
        assert_eq!(transport.param(1, "window").as_deref(), Some("15"));
    }
}
