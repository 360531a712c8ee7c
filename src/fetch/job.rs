use crate::base::context::IoResultExt;
use crate::base::loadstate::{FetchState, Progress};
use crate::base::neterror::NetError;
use crate::dns::{resolve_endpoints, Resolve};
use crate::fetch::config::FetchConfig;
use crate::http::parser::{ParsePhase, ResponseParser};
use crate::http::request::HttpRequest;
use crate::http::response::FetchResponse;
use crate::socket::connectjob::ConnectJob;
use crate::socket::stream::StreamSocket;
use crate::socket::tls::TlsContext;
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Races a suspension point against cancellation and the fetch deadline.
#[derive(Debug, Clone)]
pub(crate) struct Interrupt {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Interrupt {
    pub(crate) fn new(cancel: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    async fn guard<F, T>(&self, stage: FetchState, fut: F) -> Result<T, NetError>
    where
        F: Future<Output = Result<T, NetError>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NetError::Aborted { stage }),
            _ = expired => Err(NetError::TimedOut { stage }),
            res = fut => res,
        }
    }
}

/// Drives one fetch from Idle to a terminal state.
/// Roughly mirrors HttpNetworkTransaction's do_loop, narrowed to a single
/// HTTP/1.0 exchange over a fresh TLS connection.
pub(crate) struct FetchJob {
    tls: TlsContext,
    resolver: Arc<dyn Resolve>,
    server: String,
    request: HttpRequest,
    config: FetchConfig,
    interrupt: Interrupt,
    progress: watch::Sender<Progress>,
    state: FetchState,
}

impl FetchJob {
    pub(crate) fn new(
        tls: TlsContext,
        resolver: Arc<dyn Resolve>,
        server: String,
        request: HttpRequest,
        config: FetchConfig,
        interrupt: Interrupt,
        progress: watch::Sender<Progress>,
    ) -> Self {
        Self {
            tls,
            resolver,
            server,
            request,
            config,
            interrupt,
            progress,
            state: FetchState::Idle,
        }
    }

    /// Run to completion. The terminal state is published before returning.
    pub(crate) async fn run(mut self) -> Result<FetchResponse, NetError> {
        let result = self.do_loop().await;
        self.finish(&result);
        result
    }

    async fn do_loop(&mut self) -> Result<FetchResponse, NetError> {
        self.transition(FetchState::Resolving);
        let endpoints = self
            .interrupt
            .guard(
                self.state,
                resolve_endpoints(self.resolver.as_ref(), &self.server, &self.config.service),
            )
            .await?;

        self.transition(FetchState::Connecting);
        let tcp = self
            .interrupt
            .guard(self.state, ConnectJob::connect(&self.server, endpoints))
            .await?;

        self.transition(FetchState::Handshaking);
        let mut stream = self
            .interrupt
            .guard(self.state, self.tls.handshake(&self.server, tcp))
            .await?;

        self.exchange(&mut stream).await
    }

    /// Write the request and read the response to end-of-stream.
    pub(crate) async fn exchange<S: StreamSocket>(
        &mut self,
        stream: &mut S,
    ) -> Result<FetchResponse, NetError> {
        let mut parser = ResponseParser::new(self.config.limits());
        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];

        self.transition(FetchState::Writing);
        loop {
            match self.state {
                FetchState::Writing => {
                    self.interrupt
                        .guard(self.state, self.request.write_to(stream))
                        .await?;
                    tracing::debug!(bytes = self.request.len(), "request sent");
                    self.transition(FetchState::ReadingStatusLine);
                }
                FetchState::ReadingStatusLine
                | FetchState::ReadingHeaders
                | FetchState::ReadingBody => {
                    let n = self
                        .interrupt
                        .guard(self.state, async {
                            stream.read(&mut buf).await.read_context()
                        })
                        .await?;

                    if n == 0 {
                        tracing::debug!(
                            phase = ?parser.phase(),
                            body_len = parser.body_len(),
                            "end of stream"
                        );
                        return parser.finish();
                    }

                    // Publish how far the parser got even when the chunk fails.
                    let fed = parser.feed(&buf[..n]);
                    self.follow_parser(parser.phase(), parser.status_code());
                    fed?;
                }
                state => {
                    return Err(NetError::InvalidHttpResponse(format!(
                        "unexpected state {state:?} during exchange"
                    )))
                }
            }
        }
    }

    /// Advance through each reading state the parser has moved past.
    fn follow_parser(&mut self, phase: ParsePhase, status_code: u16) {
        let target = match phase {
            ParsePhase::StatusLine => FetchState::ReadingStatusLine,
            ParsePhase::Headers => FetchState::ReadingHeaders,
            ParsePhase::Body | ParsePhase::Complete => FetchState::ReadingBody,
        };

        if status_code != 0 {
            self.progress.send_modify(|p| p.status_code = status_code);
        }

        while self.state < target {
            let next = match self.state {
                FetchState::ReadingStatusLine => FetchState::ReadingHeaders,
                _ => FetchState::ReadingBody,
            };
            self.transition(next);
        }
    }

    fn transition(&mut self, next: FetchState) {
        if !self.state.can_advance_to(next) {
            tracing::error!(from = ?self.state, to = ?next, "illegal state transition ignored");
            return;
        }

        tracing::trace!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        self.progress.send_modify(|p| {
            p.state = next;
            if !next.is_terminal() {
                p.stage = next;
            }
        });
    }

    fn finish(&mut self, result: &Result<FetchResponse, NetError>) {
        match result {
            Ok(response) => {
                tracing::debug!(
                    server = %self.server,
                    status_code = response.status_code(),
                    body_len = response.body().len(),
                    "fetch completed"
                );
                self.transition(FetchState::Completed);
            }
            Err(e) => {
                tracing::debug!(
                    server = %self.server,
                    stage = ?self.state,
                    error = %e,
                    "fetch failed"
                );
                self.transition(FetchState::Failed);
            }
        }
    }
}
