pub mod parser;
pub mod pathbuilder;
pub mod request;
pub mod response;

// Re-exports for convenience
pub use parser::{ParsePhase, ParserLimits, ResponseParser, StatusLine};
pub use pathbuilder::{BuildPath, PathBuilder};
pub use request::HttpRequest;
pub use response::FetchResponse;
