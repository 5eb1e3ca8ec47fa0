//! Command-name resolution: does a name refer to something invocable, and what kind?
//!
//! Resolution is read-only. Nothing is ever executed.

/// Long-lived resolution context over search directories and session definitions.
pub mod context;
/// In-memory name table.
pub mod table;

pub use context::SessionResolver;
pub use table::StaticResolver;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Kinds of invocable entity a name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// A native executable program.
    Application,
    Function,
    /// A function written to consume pipeline input.
    Filter,
    Alias,
    /// A script file found on disk.
    ExternalScript,
    /// A script block defined in the session.
    Script,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Application => "application",
            CommandKind::Function => "function",
            CommandKind::Filter => "filter",
            CommandKind::Alias => "alias",
            CommandKind::ExternalScript => "external_script",
            CommandKind::Script => "script",
        }
    }

    /// Defined by the session itself rather than found on disk.
    pub fn is_session_defined(self) -> bool {
        matches!(
            self,
            CommandKind::Alias | CommandKind::Function | CommandKind::Filter | CommandKind::Script
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup order when a name matches more than one kind.
pub const PRECEDENCE: &[CommandKind] = &[
    CommandKind::Alias,
    CommandKind::Function,
    CommandKind::Filter,
    CommandKind::Script,
    CommandKind::ExternalScript,
    CommandKind::Application,
];

/// Kinds an original command must resolve to before an adapter is considered.
pub const NATIVE_KINDS: &[CommandKind] = &[CommandKind::Application];

/// Kinds an adapter command may be implemented as.
pub const ADAPTER_KINDS: &[CommandKind] = &[
    CommandKind::Application,
    CommandKind::Function,
    CommandKind::Filter,
    CommandKind::Alias,
    CommandKind::ExternalScript,
    CommandKind::Script,
];

/// A resolved invocable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHandle {
    pub name: String,
    pub kind: CommandKind,
    /// Location on disk, for applications and external scripts.
    pub path: Option<PathBuf>,
}

impl CommandHandle {
    /// A handle for a session-defined entity (no backing file).
    pub fn defined(name: &str, kind: CommandKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            path: None,
        }
    }
}

/// Looks up command names without invoking them.
pub trait Resolver: Send + Sync {
    /// Find the first entity named `name` whose kind is in `kinds`,
    /// honouring [`PRECEDENCE`].
    fn resolve(&self, name: &str, kinds: &[CommandKind]) -> Option<CommandHandle>;
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no usable search directory and no session-defined commands")]
    NoSearchPath,
}
