use crate::error::{GndError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Query parameters in request order.
pub type QueryParams = Vec<(String, String)>;

/// The backend seen as an opaque JSON-over-GET service.
pub trait GndTransport {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value>;
}

impl<T: GndTransport + ?Sized> GndTransport for &T {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        (**self).get_json(url, params)
    }
}

impl<T: GndTransport + ?Sized> GndTransport for Box<T> {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        (**self).get_json(url, params)
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl GndTransport for HttpTransport {
    fn get_json(&self, url: &str, params: &[(String, String)]) -> Result<Value> {
        debug!(url, params = params.len(), "GET");
        let response = self.client.get(url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GndError::Network {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text()?;
        Ok(serde_json::from_str::<Value>(&body)?)
    }
}
