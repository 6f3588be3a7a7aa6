//! Hierarchical, hot-reloadable level thresholds.
//!
//! A [`LevelGate`] answers "would a call at this level on this logger be
//! emitted?" against an immutable [`LevelConfig`]. Reloading swaps the whole
//! configuration at once, so readers see either the old or the new one.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::{Error, Level, Result};

/// Level thresholds keyed by logger name prefix.
///
/// # Examples
///
/// ```
/// use scoped_logger::{Level, LevelConfig};
///
/// let config = LevelConfig::new(Level::Warn)
///     .with_threshold("app", Level::Info)
///     .with_threshold("app.db", Level::Debug);
///
/// assert_eq!(config.effective_level("app.db.pool"), Level::Debug);
/// assert_eq!(config.effective_level("app.http"), Level::Info);
/// assert_eq!(config.effective_level("other"), Level::Warn);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LevelConfigFile")]
pub struct LevelConfig {
    default: Level,
    thresholds: HashMap<String, Level>,
}

#[derive(Deserialize)]
struct LevelConfigFile {
    #[serde(default)]
    default: Level,
    #[serde(default)]
    thresholds: HashMap<String, Level>,
}

impl From<LevelConfigFile> for LevelConfig {
    fn from(file: LevelConfigFile) -> Self {
        file.thresholds
            .into_iter()
            .fold(Self::new(file.default), |config, (prefix, level)| {
                config.with_threshold(prefix, level)
            })
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().replace("::", ".")
}

impl LevelConfig {
    #[must_use]
    pub fn new(default: Level) -> Self {
        Self {
            default,
            thresholds: HashMap::new(),
        }
    }

    /// Sets the threshold for every logger named `prefix` or nested below it.
    ///
    /// Rust module paths (`a::b`) are accepted and stored as `a.b`.
    #[must_use]
    pub fn with_threshold(mut self, prefix: impl AsRef<str>, level: Level) -> Self {
        self.thresholds
            .insert(normalize_name(prefix.as_ref()), level);
        self
    }

    #[must_use]
    pub const fn default_level(&self) -> Level {
        self.default
    }

    #[must_use]
    pub fn threshold(&self, prefix: &str) -> Option<Level> {
        self.thresholds.get(prefix).copied()
    }

    /// Resolves the threshold of `name` by longest configured prefix.
    #[must_use]
    pub fn effective_level(&self, name: &str) -> Level {
        let mut current = name;
        loop {
            if let Some(level) = self.thresholds.get(current) {
                return *level;
            }
            match current.rfind('.') {
                Some(index) => current = &current[..index],
                None => return self.default,
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str, level: Level) -> bool {
        self.effective_level(name) <= level
    }

    /// The most verbose level any logger can reach under this configuration.
    #[must_use]
    pub fn most_verbose(&self) -> Level {
        self.thresholds
            .values()
            .copied()
            .fold(self.default, Level::min)
    }

    /// Reads directives from the environment variable `var`.
    ///
    /// A missing variable yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not valid unicode or its
    /// directives cannot be parsed.
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(directives) => directives.parse(),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(err @ std::env::VarError::NotUnicode(_)) => Err(Error::config_source(err)),
        }
    }
}

/// Parses `env_logger`-style directives: `warn,app=info,app.db=debug`.
///
/// A bare level sets the default, a bare name enables everything for it.
impl FromStr for LevelConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut config = Self::default();
        for directive in s.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            config = match directive.split_once('=') {
                Some((name, level)) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(Error::directive(directive, "missing logger name"));
                    }
                    let level = level
                        .parse()
                        .map_err(|_| Error::directive(directive, "unknown level"))?;
                    config.with_threshold(name, level)
                }
                None => match directive.parse::<Level>() {
                    Ok(level) => Self {
                        default: level,
                        ..config
                    },
                    Err(_) => config.with_threshold(directive, Level::Trace),
                },
            };
        }
        Ok(config)
    }
}

/// Something that can produce a fresh [`LevelConfig`] on demand.
pub trait ConfigSource {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid configuration could be produced.
    fn load(&self) -> Result<LevelConfig>;
}

impl<F> ConfigSource for F
where
    F: Fn() -> Result<LevelConfig>,
{
    fn load(&self) -> Result<LevelConfig> {
        self()
    }
}

/// Loads directives from an environment variable, see [`LevelConfig::from_env`].
#[derive(Debug, Clone)]
pub struct EnvConfig {
    var: String,
}

impl EnvConfig {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<LevelConfig> {
        LevelConfig::from_env(&self.var)
    }
}

/// Lock-free level lookup over an atomically replaceable [`LevelConfig`].
pub struct LevelGate {
    active: ArcSwap<LevelConfig>,
}

impl LevelGate {
    #[must_use]
    pub fn new(config: LevelConfig) -> Self {
        Self {
            active: ArcSwap::from_pointee(config),
        }
    }

    /// The configuration currently in effect.
    ///
    /// Use it to run several lookups against one consistent configuration.
    #[must_use]
    pub fn config(&self) -> Arc<LevelConfig> {
        self.active.load_full()
    }

    #[must_use]
    pub fn effective_level(&self, name: &str) -> Level {
        self.active.load().effective_level(name)
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str, level: Level) -> bool {
        self.active.load().is_enabled(name, level)
    }

    /// Replaces the active configuration.
    pub fn reload(&self, config: LevelConfig) {
        log::debug!(
            target: "scoped_logger::gate",
            "reloading level configuration: default {}, {} thresholds",
            config.default,
            config.thresholds.len()
        );
        self.active.store(Arc::new(config));
    }

    /// Reloads from `source`, keeping the current configuration if it fails.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the source.
    pub fn reload_from(&self, source: &dyn ConfigSource) -> Result<()> {
        match source.load() {
            Ok(config) => {
                self.reload(config);
                Ok(())
            }
            Err(err) => {
                log::warn!(
                    target: "scoped_logger::gate",
                    "failed to reload level configuration: {err}, keeping current configuration"
                );
                Err(err)
            }
        }
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}

impl std::fmt::Debug for LevelGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelGate")
            .field("config", &**self.active.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_longest_prefix_match() {
        let config = LevelConfig::new(Level::Warn)
            .with_threshold("a.b", Level::Debug)
            .with_threshold("a", Level::Info);

        assert_eq!(config.effective_level("a.b.c"), Level::Debug);
        assert_eq!(config.effective_level("a.b"), Level::Debug);
        assert_eq!(config.effective_level("a.bc"), Level::Info);
        assert_eq!(config.effective_level("a"), Level::Info);
        assert_eq!(config.effective_level("z"), Level::Warn);
        assert_eq!(config.effective_level(""), Level::Warn);
    }

    #[test]
    fn test_is_enabled_is_monotonic() {
        let gate = LevelGate::new(LevelConfig::new(Level::Info));
        for name in ["a", "a.b", "x.y.z"] {
            for (index, level) in Level::ALL.iter().enumerate() {
                if gate.is_enabled(name, *level) {
                    for higher in &Level::ALL[index..] {
                        assert!(gate.is_enabled(name, *higher));
                    }
                }
            }
        }
        assert!(!gate.is_enabled("a", Level::Debug));
        assert!(gate.is_enabled("a", Level::Info));
    }

    #[test]
    fn test_reload_replaces_configuration() {
        let gate = LevelGate::default();
        assert!(!gate.is_enabled("db", Level::Debug));

        gate.reload(LevelConfig::new(Level::Error).with_threshold("db", Level::Debug));
        assert!(gate.is_enabled("db.pool", Level::Debug));
        assert!(!gate.is_enabled("http", Level::Warn));
    }

    #[test]
    fn test_reload_from_failing_source_keeps_config() {
        let gate = LevelGate::new(LevelConfig::new(Level::Debug));
        let failing = || -> Result<LevelConfig> { Err(Error::config_source("unreachable")) };

        assert!(gate.reload_from(&failing).is_err());
        assert_eq!(gate.effective_level("any"), Level::Debug);

        let working = || -> Result<LevelConfig> { Ok(LevelConfig::new(Level::Error)) };
        gate.reload_from(&working).unwrap();
        assert_eq!(gate.effective_level("any"), Level::Error);
    }

    #[test]
    fn test_parse_directives() {
        let config: LevelConfig = "warn, app=info ,app::db=debug,,noisy".parse().unwrap();

        assert_eq!(config.default_level(), Level::Warn);
        assert_eq!(config.threshold("app"), Some(Level::Info));
        assert_eq!(config.threshold("app.db"), Some(Level::Debug));
        assert_eq!(config.threshold("noisy"), Some(Level::Trace));
        assert_eq!(config.most_verbose(), Level::Trace);
    }

    #[test]
    fn test_parse_directive_errors() {
        assert!(matches!(
            "app=loud".parse::<LevelConfig>(),
            Err(Error::InvalidDirective { reason: "unknown level", .. })
        ));
        assert!(matches!(
            "=info".parse::<LevelConfig>(),
            Err(Error::InvalidDirective { reason: "missing logger name", .. })
        ));
    }

    #[test]
    fn test_deserialize_normalizes_prefixes() {
        let config: LevelConfig = serde_json::from_str(
            r#"{ "default": "error", "thresholds": { "app::db": "debug", "app": "info" } }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            LevelConfig::new(Level::Error)
                .with_threshold("app.db", Level::Debug)
                .with_threshold("app", Level::Info)
        );

        let empty: LevelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, LevelConfig::default());
    }

    #[test]
    fn test_concurrent_lookups_never_observe_torn_config() {
        const READERS: usize = 1000;

        // Any lookup mixing the two configurations resolves to some other level.
        let old = LevelConfig::new(Level::Debug)
            .with_threshold("a", Level::Trace)
            .with_threshold("a.b", Level::Info);
        let new = LevelConfig::new(Level::Warn)
            .with_threshold("a", Level::Warn)
            .with_threshold("a.b", Level::Error);
        let gate = Arc::new(LevelGate::new(old));
        let barrier = Arc::new(Barrier::new(READERS + 1));

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let mut reloaded = false;
                    for _ in 0..100 {
                        let level = gate.effective_level("a.b.c");
                        assert!(
                            level == Level::Info || level == Level::Error,
                            "observed a mixed configuration: {level:?}"
                        );
                        let enabled = gate.is_enabled("a.b.c", Level::Info);
                        assert!(!(reloaded && enabled), "observed the old configuration again");
                        reloaded |= !enabled;
                    }
                })
            })
            .collect();

        barrier.wait();
        gate.reload(new);

        for reader in readers {
            reader.join().unwrap();
        }
        assert!(!gate.is_enabled("a.b", Level::Warn));
        assert!(gate.is_enabled("a.b", Level::Error));
    }
}
