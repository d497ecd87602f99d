//! Telemetry sources.
//!
//! The telemetry backend is an external collaborator. The dashboard only
//! sees it through the [`TelemetrySource`] trait, which the HTTP client in
//! this module implements.

use std::time::Duration;

use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::telemetry::TelemetrySample;

/// Something that can hand out the latest telemetry batch.
///
/// Batches are ordered newest-first, as the telemetry endpoint returns them.
#[async_trait::async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Human-readable location of the source, for logs.
    fn describe(&self) -> String;

    /// Fetch the current batch of samples, newest-first.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreachable, answers with a failure,
    /// or sends something that isn't a sample batch.
    async fn fetch_latest(&self) -> Result<Vec<TelemetrySample>>;
}

impl std::fmt::Debug for dyn TelemetrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySource")
            .field("location", &self.describe())
            .finish()
    }
}

/// Polls a telemetry endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Option<Duration>,
}

impl HttpTelemetrySource {
    /// Create a source for `url`, optionally bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: reqwest::Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Create a source from the telemetry section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.telemetry_url()?, config.request_timeout())
    }

    /// The endpoint this source polls.
    #[must_use]
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::TelemetryTimeout {
                url: self.url.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            _ => Error::TelemetryFetch {
                url: self.url.to_string(),
                source: err,
            },
        }
    }
}

#[async_trait::async_trait]
impl TelemetrySource for HttpTelemetrySource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_latest(&self) -> Result<Vec<TelemetrySample>> {
        trace!(url = %self.url, "Requesting telemetry");

        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::TelemetryStatus {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        let batch: Vec<TelemetrySample> =
            serde_json::from_slice(&body).map_err(|source| Error::TelemetryDecode {
                url: self.url.to_string(),
                source,
            })?;

        debug!(samples = batch.len(), "Telemetry batch received");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const BATCH: &str = r#"[
        {"id": 2, "timestamp": "2025-01-15T10:30:02Z", "engine_temp": "1210.00",
         "pressure_fuel": "293.33", "altitude_km": "23.33", "velocity_kmh": "31.11",
         "attitude_roll": "0.12", "status_code": "ASCENT"},
        {"id": 1, "timestamp": "2025-01-15T10:30:01Z", "engine_temp": "1205.00",
         "pressure_fuel": "296.67", "altitude_km": "16.67", "velocity_kmh": "7.78",
         "attitude_roll": "-0.40", "status_code": "ASCENT"}
    ]"#;

    /// Serve a single canned HTTP response on an ephemeral port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            loop {
                let n = stream.read(&mut buf[read..]).await.unwrap();
                read += n;
                if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        addr
    }

    fn source_for(addr: SocketAddr, timeout: Option<Duration>) -> HttpTelemetrySource {
        let url = reqwest::Url::parse(&format!("http://{addr}/api/telemetry/")).unwrap();
        HttpTelemetrySource::new(url, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_latest_success() {
        let addr = serve_once("200 OK", BATCH).await;
        let source = source_for(addr, Some(Duration::from_secs(5)));

        let batch = source.fetch_latest().await.unwrap();
        assert_eq!(batch.len(), 2);
        // Order is preserved as received: newest-first.
        assert_eq!(batch[0].id, Some(2));
        assert_eq!(batch[1].id, Some(1));
        assert!((batch[0].velocity_kmh - 31.11).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fetch_latest_empty_batch() {
        let addr = serve_once("200 OK", "[]").await;
        let source = source_for(addr, None);

        let batch = source.fetch_latest().await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_latest_server_error() {
        let addr = serve_once("500 Internal Server Error", "{}").await;
        let source = source_for(addr, None);

        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(err, Error::TelemetryStatus { status: 500, .. }));
        assert!(err.is_telemetry_failure());
    }

    #[tokio::test]
    async fn test_fetch_latest_bad_payload() {
        let addr = serve_once("200 OK", r#"{"detail": "not a list"}"#).await;
        let source = source_for(addr, None);

        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(err, Error::TelemetryDecode { .. }));
    }

    #[tokio::test]
    async fn test_fetch_latest_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = source_for(addr, Some(Duration::from_secs(2)));
        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(err, Error::TelemetryFetch { .. }));
        assert!(err.is_telemetry_failure());
    }

    #[tokio::test]
    async fn test_fetch_latest_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and then sit on the connection without answering.
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let source = source_for(addr, Some(Duration::from_millis(100)));
        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(
            err,
            Error::TelemetryTimeout {
                timeout_ms: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_from_config() {
        let source = HttpTelemetrySource::from_config(&Config::default()).unwrap();
        assert_eq!(source.url().as_str(), "http://127.0.0.1:8000/api/telemetry/");
        assert_eq!(source.describe(), "http://127.0.0.1:8000/api/telemetry/");
    }
}
