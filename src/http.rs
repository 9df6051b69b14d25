//! HTTP client for the daily hotspot product.
//!
//! One GET per date, with a bounded timeout and no retries. Every failure (transport
//! error, non-success status, empty or undecodable body) degrades to
//! [`FetchOutcome::Empty`] so the pass renders with zero hotspots instead of aborting.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;

use crate::error::Result;
use crate::source::{EmptyReason, FetchConfig, FetchOutcome, HotspotSource};

/// Async daily hotspot fetcher
pub struct HotspotFetcher {
    client: Client,
    config: FetchConfig,
}

impl HotspotFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch and decode the CSV for `date`.
    pub async fn fetch_daily(&self, date: NaiveDate) -> FetchOutcome {
        let url = self.config.url_for_date(date);
        let req_start = Instant::now();

        // Phase 1: send request, receive headers
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("[HotspotFetcher] {} failed after {:?}: {}", url, req_start.elapsed(), e);
                return FetchOutcome::Empty(EmptyReason::Transport(e.to_string()));
            }
        };
        let headers_elapsed = req_start.elapsed();

        let status = resp.status();
        if !status.is_success() {
            warn!("[HotspotFetcher] {} answered HTTP {}", url, status);
            return FetchOutcome::Empty(EmptyReason::HttpStatus(status.as_u16()));
        }

        // Phase 2: download body
        let body_start = Instant::now();
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[HotspotFetcher] {} body download error: {}", url, e);
                return FetchOutcome::Empty(EmptyReason::Transport(e.to_string()));
            }
        };
        let body_elapsed = body_start.elapsed();

        // Phase 3: CSV decode
        let decode_start = Instant::now();
        let outcome = FetchOutcome::from_csv_body(&bytes);
        let decode_elapsed = decode_start.elapsed();

        let rows = match &outcome {
            FetchOutcome::Loaded(records) => records.len(),
            FetchOutcome::Empty(_) => 0,
        };
        info!(
            "[HotspotFetcher] {} headers={:?} body={:?}({:.1}KB) decode={:?} total={:?} rows={}",
            date,
            headers_elapsed,
            body_elapsed,
            bytes.len() as f64 / 1024.0,
            decode_elapsed,
            req_start.elapsed(),
            rows
        );

        outcome
    }
}

/// Blocking [`HotspotSource`] backed by [`HotspotFetcher`] and a private runtime.
///
/// Must not be used from inside another tokio runtime.
pub struct HttpHotspotSource {
    runtime: tokio::runtime::Runtime,
    fetcher: HotspotFetcher,
}

impl HttpHotspotSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let fetcher = HotspotFetcher::new(config)?;
        Ok(Self { runtime, fetcher })
    }
}

impl HotspotSource for HttpHotspotSource {
    fn fetch_daily(&self, date: NaiveDate) -> FetchOutcome {
        self.runtime.block_on(self.fetcher.fetch_daily(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn unreachable_config() -> FetchConfig {
        // discard port on loopback: connection is refused immediately
        FetchConfig {
            base_url: "http://127.0.0.1:9/daily".to_string(),
            timeout_secs: 2,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    /// Serve one canned HTTP/1.1 response on loopback. The handle yields the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (FetchConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).lines().next().unwrap_or_default().to_string()
        });
        let config = FetchConfig {
            base_url: format!("http://{}/daily", addr),
            timeout_secs: 5,
        };
        (config, handle)
    }

    #[tokio::test]
    async fn test_not_found_is_empty() {
        let (config, server) = serve_once("404 Not Found", "").await;
        let outcome = HotspotFetcher::new(config).unwrap().fetch_daily(date()).await;
        assert_eq!(outcome, FetchOutcome::Empty(EmptyReason::HttpStatus(404)));
        assert_eq!(
            server.await.unwrap(),
            "GET /daily/focos_diario_br_20240801.csv HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_empty() {
        let (config, server) = serve_once("200 OK", "").await;
        let outcome = HotspotFetcher::new(config).unwrap().fetch_daily(date()).await;
        assert_eq!(outcome, FetchOutcome::Empty(EmptyReason::EmptyBody));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_csv_body_is_loaded() {
        let (config, server) = serve_once("200 OK", "lat,lon\n-20.0,-55.0\n1.0,2.0\n").await;
        let outcome = HotspotFetcher::new(config).unwrap().fetch_daily(date()).await;
        match outcome {
            FetchOutcome::Loaded(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].latitude, Some(-20.0));
                assert_eq!(records[1].longitude, Some(2.0));
            }
            other => panic!("expected rows, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_is_empty() {
        let fetcher = HotspotFetcher::new(unreachable_config()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let outcome = fetcher.fetch_daily(date).await;
        assert!(matches!(outcome, FetchOutcome::Empty(EmptyReason::Transport(_))));
    }

    #[test]
    fn test_blocking_source_is_fail_soft() {
        let source = HttpHotspotSource::new(unreachable_config()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        assert!(source.fetch_daily(date).into_records().is_empty());
    }
}
