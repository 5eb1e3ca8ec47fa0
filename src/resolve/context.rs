use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{CommandHandle, CommandKind, PRECEDENCE, Resolver, ResolverError};
use crate::config::{ResolverConfig, SessionConfig};

/// The resolution context: search directories plus session-defined names.
///
/// Opened once at startup and kept for the life of the process. Directory
/// contents are read at lookup time, so newly installed adapters are picked
/// up without reopening; the directory list itself is fixed at open.
#[derive(Debug)]
pub struct SessionResolver {
    search_dirs: Vec<PathBuf>,
    script_extensions: Vec<String>,
    defined: HashMap<String, Vec<CommandKind>>,
}

impl SessionResolver {
    /// Build the context from configuration.
    ///
    /// Fails when there is nothing to resolve against at all, so a host never
    /// registers a provider that can only ever answer "not found".
    pub fn open(resolver: &ResolverConfig, session: &SessionConfig) -> Result<Self, ResolverError> {
        let mut search_dirs: Vec<PathBuf> = Vec::new();

        for raw in &resolver.extra_paths {
            match shellexpand::full(raw) {
                Ok(expanded) => search_dirs.push(PathBuf::from(expanded.as_ref())),
                Err(e) => warn!("skipping search path {raw}: {e}"),
            }
        }
        if resolver.use_path_env
            && let Some(path) = std::env::var_os("PATH")
        {
            search_dirs.extend(std::env::split_paths(&path));
        }

        let mut seen = Vec::new();
        search_dirs.retain(|dir| {
            if !dir.is_dir() || seen.contains(dir) {
                return false;
            }
            seen.push(dir.clone());
            true
        });

        let mut defined: HashMap<String, Vec<CommandKind>> = HashMap::new();
        let sections = [
            (CommandKind::Alias, &session.aliases),
            (CommandKind::Function, &session.functions),
            (CommandKind::Filter, &session.filters),
            (CommandKind::Script, &session.scripts),
        ];
        for (kind, names) in sections {
            for name in names {
                let kinds = defined.entry(name.clone()).or_default();
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }

        if search_dirs.is_empty() && defined.is_empty() {
            return Err(ResolverError::NoSearchPath);
        }

        info!(
            "resolution context opened: {} search dir(s), {} session name(s)",
            search_dirs.len(),
            defined.len()
        );

        Ok(Self {
            search_dirs,
            script_extensions: resolver
                .script_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            defined,
        })
    }

    /// Directories searched, in order.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First file named `name` on the search path, with its on-disk kind.
    ///
    /// Names containing a path separator are taken as paths and not searched.
    fn find_on_disk(&self, name: &str) -> Option<(PathBuf, CommandKind)> {
        if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(shellexpand::tilde(name).as_ref());
            return self.classify_file(&path).map(|kind| (path, kind));
        }
        self.search_dirs.iter().find_map(|dir| {
            let candidate = dir.join(name);
            self.classify_file(&candidate).map(|kind| (candidate, kind))
        })
    }

    fn classify_file(&self, path: &Path) -> Option<CommandKind> {
        let metadata = std::fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let is_script = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.script_extensions.contains(&ext));
        if is_script {
            return Some(CommandKind::ExternalScript);
        }
        if is_executable(path, &metadata) {
            return Some(CommandKind::Application);
        }
        None
    }
}

impl Resolver for SessionResolver {
    fn resolve(&self, name: &str, kinds: &[CommandKind]) -> Option<CommandHandle> {
        if name.is_empty() {
            return None;
        }

        if let Some(known) = self.defined.get(name)
            && let Some(&kind) = PRECEDENCE
                .iter()
                .filter(|k| k.is_session_defined())
                .find(|&&k| kinds.contains(&k) && known.contains(&k))
        {
            return Some(CommandHandle::defined(name, kind));
        }

        if !kinds.iter().any(|k| !k.is_session_defined()) {
            return None;
        }
        let (path, kind) = self.find_on_disk(name)?;
        if !kinds.contains(&kind) {
            debug!("{name} is {kind} at {}, not a requested kind", path.display());
            return None;
        }
        Some(CommandHandle {
            name: name.to_string(),
            kind,
            path: Some(path),
        })
    }
}

impl Drop for SessionResolver {
    fn drop(&mut self) {
        debug!("resolution context closed");
    }
}

fn is_executable(path: &Path, metadata: &Metadata) -> bool {
    #[cfg(unix)]
    {
        let _ = path;
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(windows)]
    {
        let _ = metadata;
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| matches!(ext.as_str(), "exe" | "bat" | "cmd" | "com"))
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path, metadata);
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::resolve::{ADAPTER_KINDS, NATIVE_KINDS};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").expect("write file");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .expect("set permissions");
        path
    }

    fn resolver_for(dir: &Path, session: SessionConfig) -> SessionResolver {
        let config = ResolverConfig {
            extra_paths: vec![dir.to_string_lossy().into_owned()],
            use_path_env: false,
            script_extensions: vec!["sh".into(), "py".into()],
        };
        SessionResolver::open(&config, &session).expect("open resolver")
    }

    #[test]
    fn executable_resolves_as_application() {
        let dir = TempDir::new().expect("temp dir");
        write_file(dir.path(), "ls", 0o755);
        let resolver = resolver_for(dir.path(), SessionConfig::default());

        let handle = resolver.resolve("ls", NATIVE_KINDS).expect("ls resolves");
        assert_eq!(handle.kind, CommandKind::Application);
        assert_eq!(handle.path, Some(dir.path().join("ls")));
    }

    #[test]
    fn non_executable_file_ignored() {
        let dir = TempDir::new().expect("temp dir");
        write_file(dir.path(), "notes", 0o644);
        let resolver = resolver_for(dir.path(), SessionConfig::default());
        assert!(resolver.resolve("notes", ADAPTER_KINDS).is_none());
    }

    #[test]
    fn script_extension_resolves_as_external_script() {
        let dir = TempDir::new().expect("temp dir");
        write_file(dir.path(), "report.py", 0o755);
        let resolver = resolver_for(dir.path(), SessionConfig::default());

        assert!(resolver.resolve("report.py", NATIVE_KINDS).is_none());
        assert_eq!(
            resolver.resolve("report.py", ADAPTER_KINDS).map(|h| h.kind),
            Some(CommandKind::ExternalScript)
        );
    }

    #[test]
    fn session_function_is_not_native() {
        let dir = TempDir::new().expect("temp dir");
        let session = SessionConfig {
            functions: vec!["ls-json".into()],
            ..SessionConfig::default()
        };
        let resolver = resolver_for(dir.path(), session);

        assert!(resolver.resolve("ls-json", NATIVE_KINDS).is_none());
        let handle = resolver.resolve("ls-json", ADAPTER_KINDS).expect("function");
        assert_eq!(handle.kind, CommandKind::Function);
        assert_eq!(handle.path, None);
    }

    #[test]
    fn session_alias_shadows_application() {
        let dir = TempDir::new().expect("temp dir");
        write_file(dir.path(), "df", 0o755);
        let session = SessionConfig {
            aliases: vec!["df".into()],
            ..SessionConfig::default()
        };
        let resolver = resolver_for(dir.path(), session);

        assert_eq!(
            resolver.resolve("df", ADAPTER_KINDS).map(|h| h.kind),
            Some(CommandKind::Alias)
        );
        assert_eq!(
            resolver.resolve("df", NATIVE_KINDS).map(|h| h.kind),
            Some(CommandKind::Application)
        );
    }

    #[test]
    fn explicit_path_resolved_directly() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(dir.path(), "tool", 0o755);
        let other = TempDir::new().expect("temp dir");
        let resolver = resolver_for(other.path(), SessionConfig::default());

        let name = path.to_string_lossy().into_owned();
        let handle = resolver.resolve(&name, NATIVE_KINDS).expect("path resolves");
        assert_eq!(handle.path, Some(path));
    }

    #[test]
    fn first_directory_wins() {
        let first = TempDir::new().expect("temp dir");
        let second = TempDir::new().expect("temp dir");
        write_file(first.path(), "ls", 0o755);
        write_file(second.path(), "ls", 0o755);
        let config = ResolverConfig {
            extra_paths: vec![
                first.path().to_string_lossy().into_owned(),
                second.path().to_string_lossy().into_owned(),
            ],
            use_path_env: false,
            script_extensions: vec![],
        };
        let resolver = SessionResolver::open(&config, &SessionConfig::default()).expect("open");

        let handle = resolver.resolve("ls", NATIVE_KINDS).expect("ls");
        assert_eq!(handle.path, Some(first.path().join("ls")));
    }

    #[test]
    fn missing_directories_dropped() {
        let dir = TempDir::new().expect("temp dir");
        let config = ResolverConfig {
            extra_paths: vec![
                dir.path().to_string_lossy().into_owned(),
                dir.path().join("does-not-exist").to_string_lossy().into_owned(),
            ],
            use_path_env: false,
            script_extensions: vec![],
        };
        let resolver = SessionResolver::open(&config, &SessionConfig::default()).expect("open");
        assert_eq!(resolver.search_dirs(), &[dir.path().to_path_buf()]);
    }

    #[test]
    fn nothing_to_search_fails_to_open() {
        let config = ResolverConfig {
            extra_paths: vec!["/definitely/not/a/real/dir".into()],
            use_path_env: false,
            script_extensions: vec![],
        };
        let result = SessionResolver::open(&config, &SessionConfig::default());
        assert!(matches!(result, Err(ResolverError::NoSearchPath)));
    }

    #[test]
    fn empty_name_never_resolves() {
        let dir = TempDir::new().expect("temp dir");
        let resolver = resolver_for(dir.path(), SessionConfig::default());
        assert!(resolver.resolve("", ADAPTER_KINDS).is_none());
    }
}
