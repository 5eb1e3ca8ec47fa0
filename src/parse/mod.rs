pub mod shell;
pub mod tokenize;
pub mod types;

pub use shell::BashParser;
pub use tokenize::static_word;
pub use types::{Invocation, ParsedCommandLine, Shape};

/// Turns raw command-line text into the invocations it contains.
///
/// Implementations never fail outwardly: malformed input yields zero or
/// partial invocations.
pub trait CommandParser: Send + Sync {
    fn parse(&self, text: &str) -> ParsedCommandLine;
}
