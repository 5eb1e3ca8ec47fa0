use std::collections::HashMap;

use super::{CommandHandle, CommandKind, PRECEDENCE, Resolver};

/// A fixed name → kinds table.
///
/// Useful for hosts that already know their command inventory, and for tests.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<CommandKind>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as an entity of `kind`. A name may carry several kinds.
    pub fn with(mut self, name: &str, kind: CommandKind) -> Self {
        self.insert(name, kind);
        self
    }

    pub fn insert(&mut self, name: &str, kind: CommandKind) {
        let kinds = self.entries.entry(name.to_string()).or_default();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, name: &str, kinds: &[CommandKind]) -> Option<CommandHandle> {
        let known = self.entries.get(name)?;
        PRECEDENCE
            .iter()
            .find(|&&k| kinds.contains(&k) && known.contains(&k))
            .map(|&kind| CommandHandle::defined(name, kind))
    }
}
