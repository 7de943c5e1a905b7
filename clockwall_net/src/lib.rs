//! Concrete time sources for calibration.
//!
//! `HeadDateSource` and `WorldTimeSource` talk HTTP (feature `http`, on by
//! default). `SimulatedSource` answers from a local clock shifted by a fixed
//! skew and is used offline and in tests.
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod util;

use std::time::Duration;

use clockwall_traits::{Clock, TimeSource};

use crate::error::NetError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Offline source: reports the wrapped clock's wall time plus `skew_ms`.
///
/// With `latency` set, half is spent before and half after stamping the
/// response, so a symmetric-latency estimate recovers `skew_ms` exactly.
pub struct SimulatedSource<C: Clock> {
    id: String,
    clock: C,
    skew_ms: f64,
    latency: Duration,
    fail: bool,
}

impl<C: Clock> SimulatedSource<C> {
    pub fn new(id: impl Into<String>, clock: C, skew_ms: f64) -> Self {
        Self {
            id: id.into(),
            clock,
            skew_ms,
            latency: Duration::ZERO,
            fail: false,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every fetch fail with a timeout (outage simulation).
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl<C: Clock> TimeSource for SimulatedSource<C> {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self, timeout: Duration) -> Result<f64, BoxError> {
        if self.fail {
            self.clock.sleep(timeout);
            return Err(Box::new(NetError::Timeout));
        }
        if self.latency > timeout {
            self.clock.sleep(timeout);
            return Err(Box::new(NetError::Timeout));
        }
        let half = self.latency / 2;
        self.clock.sleep(half);
        let stamped = self.clock.wall_ms() + self.skew_ms;
        self.clock.sleep(self.latency - half);
        tracing::trace!(source = %self.id, stamped, "simulated time sample");
        Ok(stamped)
    }
}

/// Source A: `HEAD` to the hosting origin, `Date` response header.
#[cfg(feature = "http")]
pub struct HeadDateSource {
    id: String,
    inner: http::HeadDate,
}

#[cfg(feature = "http")]
impl HeadDateSource {
    pub fn new(url: &str) -> error::Result<Self> {
        Ok(Self {
            id: format!("head:{url}"),
            inner: http::HeadDate::new(url)?,
        })
    }
}

#[cfg(feature = "http")]
impl TimeSource for HeadDateSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self, timeout: Duration) -> Result<f64, BoxError> {
        match self.inner.query(timeout) {
            Ok(ms) => Ok(ms),
            Err(e) => {
                tracing::debug!(source = %self.id, error = %e, "origin date query failed");
                Err(Box::new(e))
            }
        }
    }
}

/// Source B: public time endpoint, `utc_datetime` JSON field.
#[cfg(feature = "http")]
pub struct WorldTimeSource {
    id: String,
    inner: http::WorldTime,
}

#[cfg(feature = "http")]
impl WorldTimeSource {
    pub fn new(url: &str) -> error::Result<Self> {
        Ok(Self {
            id: format!("worldtime:{url}"),
            inner: http::WorldTime::new(url)?,
        })
    }
}

#[cfg(feature = "http")]
impl TimeSource for WorldTimeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self, timeout: Duration) -> Result<f64, BoxError> {
        match self.inner.query(timeout) {
            Ok(ms) => Ok(ms),
            Err(e) => {
                tracing::debug!(source = %self.id, error = %e, "world time query failed");
                Err(Box::new(e))
            }
        }
    }
}
