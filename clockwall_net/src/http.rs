use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{CACHE_CONTROL, DATE};
use tracing::trace;

use crate::error::{NetError, Result};
use crate::util::{parse_http_date, parse_utc_datetime};

fn map_reqwest(e: reqwest::Error) -> NetError {
    if e.is_timeout() {
        NetError::Timeout
    } else {
        NetError::Http(e.to_string())
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("clockwall/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(map_reqwest)
}

/// Lightweight `HEAD` against the hosting origin; reads the `Date` response header.
///
/// Any status is accepted: error pages still carry the server's clock.
pub struct HeadDate {
    client: Client,
    url: String,
}

impl HeadDate {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }

    pub fn query(&self, timeout: Duration) -> Result<f64> {
        let resp = self
            .client
            .head(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .timeout(timeout)
            .send()
            .map_err(map_reqwest)?;
        let raw = resp
            .headers()
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .ok_or(NetError::MissingTimestamp("Date header"))?;
        trace!(url = %self.url, date = raw, "origin date header");
        parse_http_date(raw)
    }
}

/// `GET` of a JSON document carrying a `utc_datetime` field.
pub struct WorldTime {
    client: Client,
    url: String,
}

impl WorldTime {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }

    pub fn query(&self, timeout: Duration) -> Result<f64> {
        let resp: Response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .timeout(timeout)
            .send()
            .map_err(map_reqwest)?;
        if !resp.status().is_success() {
            return Err(NetError::Status(resp.status().as_u16()));
        }
        let body: serde_json::Value = resp
            .json()
            .map_err(|e| NetError::Malformed(e.to_string()))?;
        extract_utc_datetime(&body)
    }
}

/// Pull the `utc_datetime` field out of a world-time payload.
pub fn extract_utc_datetime(body: &serde_json::Value) -> Result<f64> {
    let raw = body
        .get("utc_datetime")
        .and_then(serde_json::Value::as_str)
        .ok_or(NetError::MissingTimestamp("utc_datetime"))?;
    trace!(utc_datetime = raw, "world time payload");
    parse_utc_datetime(raw)
}
