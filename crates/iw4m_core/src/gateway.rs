//! Session gateway: the only component that touches the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{COOKIE, USER_AGENT};
use tracing::{debug, warn};

use crate::config::ConsoleSettings;
use crate::error::{ConsoleError, Result};
use crate::request::ConsoleRequest;

/// Shared flag a caller flips to abandon an in-flight fetch. Polled while an
/// attempt waits on the network and while a retry delay runs.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call controls layered over the gateway's own settings.
#[derive(Debug, Clone, Default)]
pub struct FetchControl {
    /// Overrides the client-wide timeout for each attempt.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelFlag>,
}

impl FetchControl {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: None,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

pub trait SessionGateway {
    /// Base URL the relative request paths are joined onto.
    fn base_url(&self) -> &str;
    fn fetch(&self, request: &ConsoleRequest, control: &FetchControl) -> Result<String>;
    fn request_count(&self) -> usize;
}

pub struct ConsoleClient {
    client: Client,
    settings: ConsoleSettings,
    request_count: AtomicUsize,
}

impl ConsoleClient {
    pub fn new(settings: ConsoleSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|source| ConsoleError::Transport {
                path: settings.base_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            settings,
            request_count: AtomicUsize::new(0),
        })
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.settings.base_url, path)
    }

    fn wait_before_retry(&self, attempt: usize, control: &FetchControl, path: &str) -> Result<()> {
        let exponent = u32::try_from(attempt).unwrap_or(8).min(8);
        let scale = 1u64.checked_shl(exponent).unwrap_or(256);
        let base = self.settings.retry_delay_ms.saturating_mul(scale);
        let jitter = (u64::try_from(attempt).unwrap_or(0) * 17 + 31) % 97;
        let deadline = Instant::now() + Duration::from_millis(base.saturating_add(jitter));
        loop {
            if control.is_cancelled() {
                return Err(cancelled(path));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl SessionGateway for ConsoleClient {
    fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    fn fetch(&self, request: &ConsoleRequest, control: &FetchControl) -> Result<String> {
        let path = request.path.as_str();
        let url = self.url_for(path);
        let max_retries = if request.retry_safe {
            self.settings.max_retries
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            if control.is_cancelled() {
                return Err(cancelled(path));
            }
            self.request_count.fetch_add(1, Ordering::Relaxed);

            let mut builder = self
                .client
                .get(&url)
                .header(USER_AGENT, self.settings.user_agent.as_str());
            if let Some(cookie) = &self.settings.cookie {
                builder = builder.header(COOKIE, cookie.as_str());
            }
            if let Some(timeout) = control.timeout {
                builder = builder.timeout(timeout);
            }

            let failure = match send_attempt(builder, control, path)? {
                Ok((status, body)) => {
                    if status.is_success() {
                        debug!(path, bytes = body.len(), "fetched console page");
                        return Ok(body);
                    }
                    let error = ConsoleError::Status {
                        path: path.to_string(),
                        status: status.as_u16(),
                    };
                    if !is_retryable_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(error) => {
                    if !is_retryable_error(&error) {
                        return Err(transport_error(path, error));
                    }
                    transport_error(path, error)
                }
            };

            if attempt >= max_retries {
                return Err(failure);
            }
            warn!(path, attempt, error = %failure, "retrying console request");
            self.wait_before_retry(attempt, control, path)?;
            attempt += 1;
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// How often a waiting fetch looks at its cancel flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

type AttemptOutcome = reqwest::Result<(StatusCode, String)>;

fn run_attempt(builder: RequestBuilder) -> AttemptOutcome {
    let response = builder.send()?;
    let status = response.status();
    if !status.is_success() {
        return Ok((status, String::new()));
    }
    Ok((status, response.text()?))
}

/// Run one attempt to completion. With a cancel flag the attempt moves to a
/// worker thread so the caller can stop waiting on it; the worker is left to
/// finish against the client timeout.
fn send_attempt(
    builder: RequestBuilder,
    control: &FetchControl,
    path: &str,
) -> Result<AttemptOutcome> {
    if control.cancel.is_none() {
        return Ok(run_attempt(builder));
    }

    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone once the caller cancelled.
        let _ = sender.send(run_attempt(builder));
    });
    loop {
        match receiver.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(outcome) => return Ok(outcome),
            Err(RecvTimeoutError::Timeout) => {
                if control.is_cancelled() {
                    return Err(cancelled(path));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ConsoleError::Interrupted {
                    path: path.to_string(),
                });
            }
        }
    }
}

fn cancelled(path: &str) -> ConsoleError {
    ConsoleError::Cancelled {
        path: path.to_string(),
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn transport_error(path: &str, source: reqwest::Error) -> ConsoleError {
    if source.is_timeout() {
        ConsoleError::Timeout {
            path: path.to_string(),
        }
    } else {
        ConsoleError::Transport {
            path: path.to_string(),
            source,
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use crate::request;

    fn settings(base_url: &str) -> ConsoleSettings {
        ConsoleSettings {
            base_url: base_url.to_string(),
            server_id: "1".to_string(),
            cookie: None,
            user_agent: "test".to_string(),
            timeout_ms: 1_000,
            max_retries: 3,
            retry_delay_ms: 0,
        }
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://host:1624", "/api/status"), "http://host:1624/api/status");
        assert_eq!(join_url("http://host:1624/", "/"), "http://host:1624/");
        assert_eq!(join_url("http://host", "About"), "http://host/About");
        assert_eq!(
            join_url("http://host", "https://cdn.example/x.png"),
            "https://cdn.example/x.png"
        );
    }

    #[test]
    fn cancelled_fetch_never_issues_a_request() {
        let client = ConsoleClient::new(settings("http://127.0.0.1:9")).expect("client");
        let cancel = CancelFlag::new();
        cancel.cancel();
        let control = FetchControl {
            timeout: None,
            cancel: Some(cancel),
        };

        let error = client
            .fetch(&request::api_status(), &control)
            .expect_err("cancelled");
        assert!(matches!(error, ConsoleError::Cancelled { .. }));
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn command_execution_is_attempted_once() {
        // Nothing listens on the discard port, so the attempt fails.
        let client = ConsoleClient::new(settings("http://127.0.0.1:9")).expect("client");
        let control = FetchControl::with_timeout(Duration::from_millis(500));

        let error = client
            .fetch(&request::execute_command("1", "!uptime"), &control)
            .expect_err("connection refused");
        assert!(error.is_transport(), "{error}");
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn cancel_stops_waiting_on_a_silent_console() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("address");
        thread::spawn(move || {
            // Accept and hold connections without ever answering.
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });

        let mut settings = settings(&format!("http://{address}"));
        settings.timeout_ms = 5_000;
        settings.max_retries = 0;
        let client = ConsoleClient::new(settings).expect("client");
        let cancel = CancelFlag::new();
        let control = FetchControl {
            timeout: None,
            cancel: Some(cancel.clone()),
        };
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });

        let started = Instant::now();
        let error = client
            .fetch(&request::api_status(), &control)
            .expect_err("cancelled");
        canceller.join().expect("canceller");

        assert!(matches!(error, ConsoleError::Cancelled { .. }), "{error}");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}
