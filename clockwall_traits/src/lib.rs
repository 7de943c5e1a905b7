pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// A single authoritative time query.
///
/// `fetch` performs one request/response round trip and returns the source's
/// reported instant as Unix epoch milliseconds. Latency compensation is done
/// by the caller, which timestamps around the call.
pub trait TimeSource {
    /// Stable identifier used in samples and logs.
    fn id(&self) -> &str;

    fn fetch(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn fetch(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).fetch(timeout)
    }
}
