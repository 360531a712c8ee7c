/// The current state of a fetch.
/// Roughly matches net/base/load_states.h, narrowed to the one-shot pipeline.
///
/// Variants are declared in pipeline order; `Ord` follows that order so a
/// transition is valid only when it moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FetchState {
    /// Constructed, no I/O started yet.
    #[default]
    Idle,

    /// Resolving the host.
    Resolving,

    /// Connecting to a resolved endpoint (TCP handshake).
    Connecting,

    /// Establishing the TLS session and verifying the certificate chain.
    Handshaking,

    /// Sending the HTTP request.
    Writing,

    /// Waiting for the status line.
    ReadingStatusLine,

    /// Reading the response header block.
    ReadingHeaders,

    /// Reading the response body until end-of-stream.
    ReadingBody,

    /// The response was read to end-of-stream.
    Completed,

    /// The fetch failed; see the recorded error.
    Failed,
}

impl FetchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchState::Completed | FetchState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Non-terminal states advance strictly forward; `Failed` is reachable
    /// from any non-terminal state; terminal states have no successors.
    pub fn can_advance_to(self, next: FetchState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == FetchState::Failed || next > self
    }
}

/// A snapshot of a fetch published after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// The current state.
    pub state: FetchState,
    /// The last non-terminal state entered; on failure, the stage that failed.
    pub stage: FetchState,
    /// The parsed status code, 0 until the status line has been read.
    pub status_code: u16,
}

impl Progress {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
