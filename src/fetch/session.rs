use crate::base::loadstate::{FetchState, Progress};
use crate::base::neterror::NetError;
use crate::dns::Resolve;
use crate::fetch::config::FetchConfig;
use crate::fetch::job::{FetchJob, Interrupt};
use crate::http::pathbuilder::BuildPath;
use crate::http::request::HttpRequest;
use crate::http::response::FetchResponse;
use crate::socket::tls::TlsContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Handle to one in-flight fetch.
///
/// The fetch runs as a task on the runtime it was spawned on; the session
/// observes it. Progress can be polled from any thread without blocking.
/// Dropping the session cancels the fetch.
///
/// ```rust,ignore
/// let tls = TlsConfig::default().build()?;
/// let mut session = FetchSession::start(&handle, tls, "example.com", "/", "https");
/// session.wait().await;
/// if let Some(response) = session.response() {
///     println!("{} bytes", response.body().len());
/// }
/// ```
pub struct FetchSession {
    progress: watch::Receiver<Progress>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<FetchResponse, NetError>>>,
    outcome: Option<Result<FetchResponse, NetError>>,
}

impl FetchSession {
    pub fn builder(
        tls: TlsContext,
        server: impl Into<String>,
        path: impl BuildPath,
    ) -> FetchSessionBuilder {
        FetchSessionBuilder::new(tls, server, path)
    }

    /// Spawn a fetch of `https://server/path` on `handle`.
    pub fn start(
        handle: &Handle,
        tls: TlsContext,
        server: &str,
        path: impl BuildPath,
        service: &str,
    ) -> Self {
        Self::builder(tls, server, path).service(service).spawn(handle)
    }

    /// Latest published snapshot.
    pub fn progress(&self) -> Progress {
        let progress = *self.progress.borrow();
        match &self.outcome {
            Some(Err(_)) if !progress.is_terminal() => Progress {
                state: FetchState::Failed,
                ..progress
            },
            _ => progress,
        }
    }

    pub fn state(&self) -> FetchState {
        self.progress().state
    }

    /// The parsed status code, 0 until the status line has been read.
    pub fn status_code(&self) -> u16 {
        self.progress().status_code
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Request cancellation. The fetch fails with `Cancelled` at its next
    /// suspension point; a fetch already terminal is unaffected.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the fetch reaches a terminal state.
    ///
    /// Safe to call repeatedly and to drop mid-wait. From outside the
    /// runtime, drive it with `handle.block_on(session.wait())`.
    pub async fn wait(&mut self) -> FetchState {
        if let Some(task) = self.task.as_mut() {
            let outcome = match task.await {
                Ok(result) => result,
                Err(e) => {
                    let stage = self.progress.borrow().stage;
                    tracing::warn!(error = %e, stage = ?stage, "fetch task did not finish");
                    Err(NetError::Aborted { stage })
                }
            };
            self.task = None;
            self.outcome = Some(outcome);
        }
        self.state()
    }

    /// The outcome, once [`wait`](Self::wait) has observed it.
    pub fn result(&self) -> Option<Result<&FetchResponse, &NetError>> {
        self.outcome.as_ref().map(Result::as_ref)
    }

    /// The response of a completed fetch.
    pub fn response(&self) -> Option<&FetchResponse> {
        self.outcome.as_ref().and_then(|r| r.as_ref().ok())
    }

    /// The error of a failed fetch.
    pub fn error(&self) -> Option<&NetError> {
        self.outcome.as_ref().and_then(|r| r.as_ref().err())
    }

    /// Wait for the fetch and take its outcome.
    pub async fn into_result(mut self) -> Result<FetchResponse, NetError> {
        self.wait().await;
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => Err(NetError::Aborted {
                stage: self.progress.borrow().stage,
            }),
        }
    }

    fn failed(error: NetError) -> Self {
        let (_tx, progress) = watch::channel(Progress {
            state: FetchState::Failed,
            stage: FetchState::Idle,
            status_code: 0,
        });
        Self {
            progress,
            cancel: CancellationToken::new(),
            task: None,
            outcome: Some(Err(error)),
        }
    }
}

impl Drop for FetchSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for FetchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchSession")
            .field("progress", &self.progress())
            .field("finished", &self.outcome.is_some())
            .finish()
    }
}

/// Builder for a [`FetchSession`].
pub struct FetchSessionBuilder {
    tls: TlsContext,
    server: String,
    path: String,
    config: FetchConfig,
    resolver: Option<Arc<dyn Resolve>>,
    cancel: Option<CancellationToken>,
}

impl FetchSessionBuilder {
    pub fn new(tls: TlsContext, server: impl Into<String>, path: impl BuildPath) -> Self {
        Self {
            tls,
            server: server.into(),
            path: path.build_path(),
            config: FetchConfig::default(),
            resolver: None,
            cancel: None,
        }
    }

    /// Service name or numeric port, `https` by default.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Resolver used for host lookup; overrides [`FetchConfig::resolver`].
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Tie the fetch to an outer token: cancelling it cancels the fetch.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Spawn the fetch on `handle` and return its session.
    ///
    /// An invalid server or path yields a session that is already
    /// `Failed` with `InvalidRequest`; no I/O is attempted.
    pub fn spawn(self, handle: &Handle) -> FetchSession {
        let span = tracing::debug_span!("fetch", server = %self.server, path = %self.path);
        let (job, progress, cancel) = match self.into_job() {
            Ok(parts) => parts,
            Err(e) => {
                tracing::debug!(error = %e, "request rejected before I/O");
                return FetchSession::failed(e);
            }
        };

        let task = handle.spawn(job.run().instrument(span));
        FetchSession {
            progress,
            cancel,
            task: Some(task),
            outcome: None,
        }
    }

    /// Run the fetch on the current task.
    pub async fn run(self) -> Result<FetchResponse, NetError> {
        let span = tracing::debug_span!("fetch", server = %self.server, path = %self.path);
        let (job, _progress, _cancel) = self.into_job()?;
        job.run().instrument(span).await
    }

    fn into_job(
        self,
    ) -> Result<(FetchJob, watch::Receiver<Progress>, CancellationToken), NetError> {
        let request = HttpRequest::get(&self.server, &self.path)?;

        let cancel = match self.cancel {
            Some(outer) => outer.child_token(),
            None => CancellationToken::new(),
        };
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => self.config.resolver.build(),
        };

        let (tx, rx) = watch::channel(Progress::default());
        let job = FetchJob::new(
            self.tls,
            resolver,
            self.server,
            request,
            self.config,
            Interrupt::new(cancel.clone(), deadline),
            tx,
        );
        Ok((job, rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::ErrorKind;
    use crate::http::pathbuilder::PathBuilder;

    #[tokio::test]
    async fn test_invalid_path_fails_before_io() {
        let tls = TlsContext::new().unwrap();
        let mut session = FetchSession::start(
            &Handle::current(),
            tls,
            "example.com",
            "no-leading-slash",
            "https",
        );

        assert_eq!(session.state(), FetchState::Failed);
        assert_eq!(session.wait().await, FetchState::Failed);
        assert_eq!(session.progress().stage, FetchState::Idle);
        assert_eq!(session.error().unwrap().kind(), ErrorKind::InvalidRequest);
        assert!(session.response().is_none());
    }

    #[tokio::test]
    async fn test_invalid_server_fails_before_io() {
        let tls = TlsContext::new().unwrap();
        let err = FetchSession::builder(tls, "bad host", "/")
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_path_builder_is_consumed() {
        let mut path = PathBuilder::new("/search");
        path.add_param("q", "a b");
        let builder = FetchSession::builder(TlsContext::new().unwrap(), "example.com", &path);
        assert_eq!(builder.path, "/search?q=a+b");
    }

    #[tokio::test]
    async fn test_outer_token_cancels() {
        let outer = CancellationToken::new();
        outer.cancel();

        let mut session = FetchSession::builder(TlsContext::new().unwrap(), "127.0.0.1", "/")
            .service("9")
            .cancellation_token(outer)
            .spawn(&Handle::current());

        assert_eq!(session.wait().await, FetchState::Failed);
        assert_eq!(session.error().unwrap().kind(), ErrorKind::Cancelled);
        assert_eq!(session.progress().stage, FetchState::Resolving);
    }

    #[tokio::test]
    async fn test_wait_is_repeatable() {
        let mut session = FetchSession::builder(TlsContext::new().unwrap(), "127.0.0.1", "/")
            .service("not-a-service")
            .spawn(&Handle::current());

        assert_eq!(session.wait().await, FetchState::Failed);
        assert_eq!(session.wait().await, FetchState::Failed);
        assert!(session.result().unwrap().is_err());
        assert_eq!(session.status_code(), 0);
    }
}
