use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Log level name understood by `log::LevelFilter` (`off`, `info`, `debug`, ...).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Where the resolver looks for applications and external scripts.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ResolverConfig {
    /// Directories searched ahead of `$PATH`. Tilde and env vars are expanded.
    #[serde(default)]
    pub extra_paths: Vec<String>,
    #[serde(default)]
    pub use_path_env: bool,
    /// File extensions (without the dot) that classify a file as an external script.
    #[serde(default)]
    pub script_extensions: Vec<String>,
}

/// Invocables defined by the interactive session rather than found on disk.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    resolver: ResolverOverlay,
    #[serde(default)]
    session: SessionOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ResolverOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    extra_paths: Vec<String>,
    use_path_env: Option<bool>,
    #[serde(default)]
    script_extensions: Vec<String>,
    #[serde(default)]
    remove_extra_paths: Vec<String>,
    #[serde(default)]
    remove_script_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SessionOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    functions: Vec<String>,
    #[serde(default)]
    filters: Vec<String>,
    #[serde(default)]
    scripts: Vec<String>,
    #[serde(default)]
    remove_aliases: Vec<String>,
    #[serde(default)]
    remove_functions: Vec<String>,
    #[serde(default)]
    remove_filters: Vec<String>,
    #[serde(default)]
    remove_scripts: Vec<String>,
}

// ── Merge logic ──

/// Fold `add` into `base`, dropping `remove` first. With `replace` the
/// overlay's list is taken as-is and `remove` is ignored.
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Embedded defaults with the user's overlay, if there is one, applied on top.
    ///
    /// An unreadable or invalid overlay is skipped and the defaults stand.
    /// Search directories, script extensions and session names accumulate;
    /// `log_level` and `use_path_env` are overridden.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// `~/.config/json-adapter/config.toml`, parsed. `None` when absent or invalid.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/json-adapter/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("json-adapter: config parse error: {e}");
                None
            }
        }
    }

    /// Render the merged configuration back to TOML (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.settings.log_level {
            self.settings.log_level = v;
        }

        let r = overlay.resolver;
        merge_list(
            &mut self.resolver.extra_paths,
            r.extra_paths,
            &r.remove_extra_paths,
            r.replace,
        );
        merge_list(
            &mut self.resolver.script_extensions,
            r.script_extensions,
            &r.remove_script_extensions,
            r.replace,
        );
        if let Some(v) = r.use_path_env {
            self.resolver.use_path_env = v;
        }

        let s = overlay.session;
        merge_list(
            &mut self.session.aliases,
            s.aliases,
            &s.remove_aliases,
            s.replace,
        );
        merge_list(
            &mut self.session.functions,
            s.functions,
            &s.remove_functions,
            s.replace,
        );
        merge_list(
            &mut self.session.filters,
            s.filters,
            &s.remove_filters,
            s.replace,
        );
        merge_list(
            &mut self.session.scripts,
            s.scripts,
            &s.remove_scripts,
            s.replace,
        );
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
