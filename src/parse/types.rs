//! Types produced by the command-line parser and consumed by the engine.

use std::ops::Range;

/// One command invocation found in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The exact substring of the original command line spanning this invocation.
    pub source_text: String,

    /// The invoked command's name with static quoting removed.
    ///
    /// `None` when the name is computed at run time (`$CMD`, `$(which ls)`).
    pub command_name: Option<String>,

    /// Byte range of `source_text` within the original command line.
    pub span: Range<usize>,
}

/// Structural shape of a whole command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Nothing but whitespace or comments.
    Empty,
    /// A single command or a linear pipeline of commands.
    Pipeline,
    /// Lists (`&&`, `||`, `;`), control flow, function definitions, groups.
    Compound,
    /// The parser had to recover from syntax errors.
    Malformed,
}

/// All invocations in a command line, in lexical (pre-order) order.
///
/// For `ls -la | grep x` there are two invocations and the shape is
/// [`Shape::Pipeline`]. For `echo $(ls)` there are also two: the outer
/// `echo $(ls)` followed by the nested `ls`.
#[derive(Debug, Clone)]
pub struct ParsedCommandLine {
    pub invocations: Vec<Invocation>,
    pub shape: Shape,
    /// Text that applies to the whole pipeline and must follow its last
    /// stage: stdout redirections and a background `&`.
    pub trailer: Option<String>,
}

impl ParsedCommandLine {
    /// A parse that found nothing. Used for any parse failure.
    pub fn empty() -> Self {
        Self {
            invocations: Vec::new(),
            shape: Shape::Empty,
            trailer: None,
        }
    }
}
