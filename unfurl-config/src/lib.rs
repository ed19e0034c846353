//! Loader for unfurl configuration with YAML + environment overlays.
//!
//! Every tunable of the pipeline lives here as data: fetch timeouts and user
//! agent, renderer pool sizing, the SPA heuristic signatures and threshold,
//! the popular-host list, and the per-field selector chains. Sections that a
//! file omits fall back to the built-in tables in [`defaults`].
//!
//! Precedence, lowest first: built-in defaults, files/YAML snippets in the
//! order they were added, then `UNFURL__`-prefixed environment variables
//! (`UNFURL__FETCH__STATIC_TIMEOUT_SECS=5`). List tables take `;`-separated
//! values (`UNFURL__POPULAR_HOSTS="x.com;github.com"`). String values may
//! reference `${VAR}` placeholders which are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use unfurl_common::observability::LogFormat;

pub mod defaults;

use defaults::owned;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Separator for list values in env overrides. Selectors may contain commas.
pub const ENV_LIST_SEPARATOR: &str = ";";

/// Keys whose env override is split on [`ENV_LIST_SEPARATOR`].
const LIST_KEYS: &[&str] = &[
    "popular_hosts",
    "heuristics.signatures",
    "selectors.title",
    "selectors.description",
    "selectors.image",
    "selectors.site",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnfurlConfig {
    /// Schema version; only `"1"` is understood.
    #[serde(deserialize_with = "version_string")]
    pub version: Option<String>,
    pub fetch: FetchSettings,
    pub renderer: RendererSettings,
    pub heuristics: SpaSettings,
    pub popular_hosts: PopularHosts,
    pub selectors: SelectorSettings,
    pub logging: LoggingSettings,
}

/// Accept `version: 1` as well as `version: "1"`.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Static (non-rendering) fetch settings. The user agent is shared with the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub user_agent: String,
    pub static_timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            static_timeout_secs: defaults::STATIC_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    pub launch_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    /// Upper bound on simultaneous browser sessions.
    pub max_concurrent: usize,
    /// How long a rendered fetch may wait for a free browser slot.
    pub queue_timeout_secs: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            headless: true,
            launch_timeout_secs: defaults::LAUNCH_TIMEOUT_SECS,
            navigation_timeout_secs: defaults::NAVIGATION_TIMEOUT_SECS,
            max_concurrent: defaults::MAX_CONCURRENT_RENDERS,
            queue_timeout_secs: defaults::QUEUE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaSettings {
    pub unsupported_browser_marker: String,
    pub signatures: Vec<String>,
    /// Trimmed markup shorter than this (in characters) counts as an empty shell.
    pub min_content_length: usize,
}

impl Default for SpaSettings {
    fn default() -> Self {
        Self {
            unsupported_browser_marker: defaults::UNSUPPORTED_BROWSER_MARKER.to_string(),
            signatures: owned(defaults::SPA_SIGNATURES),
            min_content_length: defaults::MIN_CONTENT_LENGTH,
        }
    }
}

/// Hosts that are always rendered, matched by substring against the URL host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopularHosts(pub Vec<String>);

impl Default for PopularHosts {
    fn default() -> Self {
        Self(owned(defaults::POPULAR_HOSTS))
    }
}

/// Priority-ordered CSS selector chains, one per output field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub image: Vec<String>,
    pub site: Vec<String>,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            title: owned(defaults::TITLE_SELECTORS),
            description: owned(defaults::DESCRIPTION_SELECTORS),
            image: owned(defaults::IMAGE_SELECTORS),
            site: owned(defaults::SITE_SELECTORS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub log_dir: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            log_dir: None,
            filter: "info".to_string(),
        }
    }
}

/// Reasons a merged configuration is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config version {0:?} (expected \"1\")")]
    Version(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("selector chain for `{0}` is empty")]
    EmptyChain(&'static str),
}

impl UnfurlConfig {
    /// Check invariants the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(v) = &self.version {
            if v != defaults::CONFIG_VERSION {
                return Err(ValidationError::Version(v.clone()));
            }
        }

        let positive = [
            ("fetch.static_timeout_secs", self.fetch.static_timeout_secs),
            ("renderer.launch_timeout_secs", self.renderer.launch_timeout_secs),
            (
                "renderer.navigation_timeout_secs",
                self.renderer.navigation_timeout_secs,
            ),
            ("renderer.queue_timeout_secs", self.renderer.queue_timeout_secs),
            ("renderer.max_concurrent", self.renderer.max_concurrent as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ValidationError::Zero(*name));
        }

        let chains = [
            ("title", &self.selectors.title),
            ("description", &self.selectors.description),
            ("image", &self.selectors.image),
            ("site", &self.selectors.site),
        ];
        if let Some((field, _)) = chains.iter().find(|(_, c)| c.is_empty()) {
            return Err(ValidationError::EmptyChain(*field));
        }

        Ok(())
    }

    /// Render the effective configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct UnfurlConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for UnfurlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl UnfurlConfigLoader {
    /// Start from built-in defaults plus `UNFURL__` env overrides.
    ///
    /// ```
    /// use unfurl_config::UnfurlConfigLoader;
    ///
    /// let config = UnfurlConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nfetch:\n  static_timeout_secs: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.fetch.static_timeout_secs, 3);
    /// assert_eq!(config.selectors.title[0], "meta[property='og:title']");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing, so deployments
    /// can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, then deserialize and validate.
    ///
    /// ```
    /// use unfurl_config::UnfurlConfigLoader;
    ///
    /// unsafe { std::env::set_var("UNFURL_DOC_AGENT", "DocBot/2.0"); }
    ///
    /// let config = UnfurlConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// fetch:
    ///   user_agent: "${UNFURL_DOC_AGENT}"
    /// popular_hosts: ["example.org"]
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.fetch.user_agent, "DocBot/2.0");
    /// assert_eq!(config.popular_hosts.0, vec!["example.org".to_string()]);
    /// assert_eq!(config.renderer.navigation_timeout_secs, 15);
    ///
    /// unsafe { std::env::remove_var("UNFURL_DOC_AGENT"); }
    /// ```
    pub fn load(self) -> Result<UnfurlConfig, ConfigError> {
        // Env is added last so it overrides every file.
        let cfg = self
            .builder
            .add_source(
                LIST_KEYS.iter().fold(
                    Environment::with_prefix("UNFURL")
                        .separator("__")
                        .try_parsing(true)
                        .list_separator(ENV_LIST_SEPARATOR),
                    |env, key| env.with_list_parse_key(*key),
                ),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: UnfurlConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("UNFURL_TEST_UA", Some("Bot/1"), || {
            let mut v = json!("agent=${UNFURL_TEST_UA}");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("agent=Bot/1"));
        });
    }

    #[test]
    fn expands_inside_arrays() {
        temp_env::with_var("UNFURL_TEST_HOST", Some("example.net"), || {
            let mut v = json!({ "popular_hosts": ["${UNFURL_TEST_HOST}", "x.com"] });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "popular_hosts": ["example.net", "x.com"] }));
        });
    }

    #[test]
    fn cyclic_references_terminate() {
        temp_env::with_vars([("UNFURL_A", Some("${UNFURL_B}")), ("UNFURL_B", Some("${UNFURL_A}"))], || {
            let mut v = json!("x=${UNFURL_A}");
            expand_env_in_value(&mut v);
            assert!(v.as_str().unwrap().contains("${"));
        });
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = UnfurlConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.fetch.static_timeout_secs, 10);
        assert_eq!(cfg.renderer.navigation_timeout_secs, 15);
        assert_eq!(cfg.heuristics.min_content_length, 1000);
        assert_eq!(cfg.popular_hosts.0.len(), 9);
    }

    #[test]
    fn rejects_unknown_version() {
        let cfg = UnfurlConfig {
            version: Some("2".into()),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ValidationError::Version("2".into())));
    }

    #[test]
    fn rejects_zero_pool() {
        let mut cfg = UnfurlConfig::default();
        cfg.renderer.max_concurrent = 0;
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::Zero("renderer.max_concurrent"))
        );
    }

    #[test]
    fn rejects_empty_chain() {
        let mut cfg = UnfurlConfig::default();
        cfg.selectors.site.clear();
        assert_eq!(cfg.validate(), Err(ValidationError::EmptyChain("site")));
    }

    #[test]
    fn yaml_dump_contains_chains() {
        let yaml = UnfurlConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("og:site_name"));
        assert!(yaml.contains("popular_hosts"));
    }
}
