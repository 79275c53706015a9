use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;

/// A GET request against a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub url: String,
    /// Extra headers (auth keys)
    pub headers: Vec<(String, String)>,
}

/// Performs one raw HTTP GET and returns the body of a 2xx response
pub trait Transport: Send + Sync {
    fn get(
        &self,
        request: &ProviderRequest,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &ProviderRequest) -> Result<String, FetchError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| FetchError::InvalidRequest(format!("bad url {}: {}", request.url, e)))?;

        let mut builder = self.client.get(url).header("Accept", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| self.classify(e))
    }
}

impl HttpTransport {
    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            e.into()
        }
    }
}

/// Rate-limited, time-boxed, cancellable front for a [`Transport`].
///
/// All callers share one spacing gate: a call made sooner than `min_spacing`
/// after the previous one waits out the difference. The gate is stamped
/// before the request goes out, so failed calls count too.
pub struct RequestScheduler<T> {
    transport: T,
    min_spacing: Duration,
    timeout: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<T: Transport> RequestScheduler<T> {
    pub fn new(transport: T, min_spacing: Duration, timeout: Duration) -> Self {
        Self {
            transport,
            min_spacing,
            timeout,
            last_call: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request through the gate
    pub async fn fetch(
        &self,
        request: &ProviderRequest,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        {
            // Held through the wait so concurrent callers queue behind each other
            let mut last_call = self.last_call.lock().await;
            if let Some(previous) = *last_call {
                let wait = self.min_spacing.saturating_sub(previous.elapsed());
                if !wait.is_zero() {
                    debug!("Rate limit: waiting {:?} before {}", wait, request.url);
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = time::sleep(wait) => {}
                    }
                }
            }
            *last_call = Some(Instant::now());
        }

        debug!("GET {}", request.url);

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = time::timeout(self.timeout, self.transport.get(request)) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout(self.timeout)),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    use super::*;

    /// Scripted transport: replays queued responses, then repeats `fallback`
    #[derive(Clone)]
    pub struct FakeTransport {
        script: Arc<StdMutex<VecDeque<Result<String, FetchError>>>>,
        fallback: Arc<StdMutex<Result<String, FetchError>>>,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl FakeTransport {
        pub fn always(outcome: Result<String, FetchError>) -> Self {
            Self {
                script: Arc::new(StdMutex::new(VecDeque::new())),
                fallback: Arc::new(StdMutex::new(outcome)),
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }

        pub fn then(self, outcome: Result<String, FetchError>) -> Self {
            self.script.lock().unwrap().push_back(outcome);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn set_fallback(&self, outcome: Result<String, FetchError>) {
            *self.fallback.lock().unwrap() = outcome;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for FakeTransport {
        async fn get(&self, _request: &ProviderRequest) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
            let scripted = self.script.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        }
    }
}
