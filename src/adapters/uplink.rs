//! HTTP telemetry uplink adapter.
//!
//! Implements [`TelemetryPostPort`]: a form-encoded POST, best effort.
//!
//! - **`target_os = "espidf"`**: `embedded_svc` HTTP client over `EspHttpConnection`.
//! - **all other targets**: [`SimUplink`] records posts and can fake a status.

use crate::app::ports::TelemetryPostPort;
use crate::error::UplinkError;

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[cfg(target_os = "espidf")]
mod http {
    use core::time::Duration;

    use embedded_svc::http::client::Client as HttpClient;
    use embedded_svc::http::{Method, Status};
    use embedded_svc::io::Write;
    use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

    use super::CONTENT_TYPE;
    use crate::app::ports::TelemetryPostPort;
    use crate::error::UplinkError;

    /// Opens a fresh connection per post; posts are 30 minutes apart.
    pub struct HttpUplink {
        timeout: Duration,
    }

    impl HttpUplink {
        pub fn new() -> Self {
            Self { timeout: Duration::from_secs(10) }
        }
    }

    impl Default for HttpUplink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TelemetryPostPort for HttpUplink {
        fn post(&mut self, url: &str, body: &str) -> Result<u16, UplinkError> {
            let conf = HttpClientConfiguration {
                timeout: Some(self.timeout),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let conn = EspHttpConnection::new(&conf).map_err(|_| UplinkError::Request)?;
            let mut client = HttpClient::wrap(conn);

            let len_buf = itoa_len(body.len());
            let headers = [
                ("Content-Type", CONTENT_TYPE),
                ("Content-Length", len_buf.as_str()),
            ];
            let mut request = client
                .request(Method::Post, url, &headers)
                .map_err(|_| UplinkError::Request)?;
            request.write_all(body.as_bytes()).map_err(|_| UplinkError::Request)?;
            request.flush().map_err(|_| UplinkError::Request)?;
            let response = request.submit().map_err(|_| UplinkError::Request)?;

            let status = response.status();
            if (200..300).contains(&status) {
                Ok(status)
            } else {
                Err(UplinkError::Status(status))
            }
        }
    }

    fn itoa_len(len: usize) -> heapless::String<12> {
        use core::fmt::Write as _;
        let mut s = heapless::String::new();
        let _ = write!(s, "{}", len);
        s
    }
}

#[cfg(target_os = "espidf")]
pub use http::HttpUplink;

// ───────────────────────────────────────────────────────────────
// Simulation uplink
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimUplinkState {
    posts: Vec<(String, String)>,
    status: Option<u16>,
}

/// Records `(url, body)` pairs.  Clones share the record.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct SimUplink {
    state: Arc<Mutex<SimUplinkState>>,
}

#[cfg(not(target_os = "espidf"))]
impl SimUplink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimUplinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every subsequent post with `status` (default 200).
    pub fn respond_with(&self, status: u16) {
        self.lock().status = Some(status);
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.lock().posts.clone()
    }
}

#[cfg(not(target_os = "espidf"))]
impl TelemetryPostPort for SimUplink {
    fn post(&mut self, url: &str, body: &str) -> Result<u16, UplinkError> {
        let mut s = self.lock();
        s.posts.push((url.to_owned(), body.to_owned()));
        log::info!("HTTP(sim): POST {} [{}] {}", url, CONTENT_TYPE, body);
        match s.status.unwrap_or(200) {
            status @ 200..=299 => Ok(status),
            status => Err(UplinkError::Status(status)),
        }
    }
}
