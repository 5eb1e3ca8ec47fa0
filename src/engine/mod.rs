use log::debug;
pub use tokio_util::sync::CancellationToken;

use crate::parse::{CommandParser, Invocation, Shape};
use crate::resolve::{ADAPTER_KINDS, NATIVE_KINDS, Resolver};

/// Appended to a native command's name to form its adapter's name.
pub const ADAPTER_SUFFIX: &str = "-json";

/// Name of the adapter command for `command_name`.
pub fn adapter_name(command_name: &str) -> String {
    format!("{command_name}{ADAPTER_SUFFIX}")
}

/// Decides, per pipeline segment, whether to splice in an adapter stage.
pub struct SuggestionEngine {
    parser: Box<dyn CommandParser>,
    resolver: Box<dyn Resolver>,
}

impl SuggestionEngine {
    pub fn new(parser: Box<dyn CommandParser>, resolver: Box<dyn Resolver>) -> Self {
        Self { parser, resolver }
    }

    /// Propose a rewritten pipeline for `command_line`, or `None`.
    ///
    /// Every invocation's source text is kept verbatim and in order; the only
    /// change is an ` | <name>-json` stage after each native command that has
    /// an adapter. Returns `None` when no segment qualifies, when the command
    /// line is not a well-formed linear pipeline, or when `token` is cancelled
    /// before the rewrite is complete. Pipeline-wide stdout redirections and a
    /// trailing `&` are carried after the last stage.
    pub fn analyze(&self, command_line: &str, token: &CancellationToken) -> Option<String> {
        let parsed = self.parser.parse(command_line);
        match parsed.shape {
            Shape::Empty => return None,
            Shape::Compound => {
                debug!("not a linear pipeline, skipping");
                return None;
            }
            Shape::Malformed => {
                debug!("syntax errors, skipping");
                return None;
            }
            Shape::Pipeline => {}
        }

        let mut stages = Vec::with_capacity(parsed.invocations.len());
        let mut adapter_found = false;

        for (i, invocation) in parsed.invocations.iter().enumerate() {
            if token.is_cancelled() {
                debug!("analysis cancelled at segment {i}");
                return None;
            }
            match self.adapter_for(invocation, &parsed.invocations[i + 1..]) {
                Some(adapter) => {
                    stages.push(format!("{} | {adapter}", invocation.source_text));
                    adapter_found = true;
                }
                None => stages.push(invocation.source_text.clone()),
            }
        }

        if !adapter_found || token.is_cancelled() {
            return None;
        }
        let mut rewrite = stages.join(" | ");
        if let Some(trailer) = &parsed.trailer {
            rewrite.push(' ');
            rewrite.push_str(trailer);
        }
        Some(rewrite)
    }

    /// The adapter to splice after `invocation`, if any.
    ///
    /// Only names that resolve to an application are considered. When any
    /// `later` invocation already runs the adapter, nothing is spliced; with
    /// nested substitutions the adapter need not be the very next invocation.
    fn adapter_for(&self, invocation: &Invocation, later: &[Invocation]) -> Option<String> {
        let name = invocation.command_name.as_deref()?;
        self.resolver.resolve(name, NATIVE_KINDS)?;

        let adapter = adapter_name(name);
        if later.iter().any(|l| l.command_name.as_deref() == Some(adapter.as_str())) {
            debug!("{name} already piped into {adapter}");
            return None;
        }

        let handle = self.resolver.resolve(&adapter, ADAPTER_KINDS)?;
        debug!("{name}: found adapter {adapter} ({})", handle.kind);
        Some(adapter)
    }
}
