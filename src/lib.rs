//! json-adapter: suggests JSON adapter commands for native programs in shell pipelines.
//!
//! Given a command line such as `ls -la | grep src`, the engine finds each
//! command invocation, checks whether it names a native application, and if
//! a companion `<name>-json` command exists, proposes the rewrite
//! `ls -la | ls-json | grep src`. Nothing is ever executed.
//!
//! # Architecture
//!
//! - **[`parse`]** — Command-line parsing: tree-sitter-bash walker yielding invocations in lexical order.
//! - **[`resolve`]** — Command-name resolution against search directories and session definitions.
//! - **[`engine`]** — Adapter suggestion engine and cooperative cancellation.
//! - **[`session`]** — Held suggestion and usage counters.
//! - **[`provider`]** — Feedback-provider and predictor interfaces implemented over the engine.
//! - **[`host`]** — Registration and the line-delimited JSON host protocol.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — File logging to `~/.local/share/json-adapter/json-adapter.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Adapter suggestion engine.
pub mod engine;
/// Host registration and JSON-lines protocol.
pub mod host;
/// File-based logging setup.
pub mod logging;
/// Command-line parsing: tree-sitter AST walk, word unquoting, invocation types.
pub mod parse;
/// Feedback provider and suggestion predictor.
pub mod provider;
/// Command-name resolution.
pub mod resolve;
/// Suggestion session state.
pub mod session;

use engine::{CancellationToken, SuggestionEngine};
use parse::BashParser;
use resolve::Resolver;

/// Analyze `command_line` against `resolver` with the bash parser.
///
/// Convenience entry point for tests and one-shot usage. Long-running hosts
/// should build a [`host::Registration`] once and reuse it.
pub fn suggest(command_line: &str, resolver: Box<dyn Resolver>) -> Option<String> {
    SuggestionEngine::new(Box::new(BashParser::new()), resolver)
        .analyze(command_line, &CancellationToken::new())
}
