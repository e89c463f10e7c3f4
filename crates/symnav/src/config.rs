//! Configuration management for symnav.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/symnav/config.json`
//! 2. Environment variable: `SYMNAV_CONFIG_CONTENT`
//! 3. Project config: `symnav.jsonc` or `symnav.json` in the project directory
//!
//! Supports JSONC (JSON with comments) and variable substitution:
//! - `{env:VAR_NAME}` - Substitute environment variable
//! - `{file:path}` - Substitute file contents

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use symnav_lsp::{apply_overrides, default_configs, LspConfig};
use symnav_symbols::{OperationSettings, OutputFormat, DEFAULT_MAX_ANSWER_CHARS};
use thiserror::Error;
use tracing::warn;

/// Environment variable holding inline configuration.
pub const CONFIG_CONTENT_ENV: &str = "SYMNAV_CONFIG_CONTENT";

/// Static regex for variable substitution, compiled once.
static VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

/// Get the variable substitution regex, compiling it once on first use.
fn var_regex() -> &'static regex::Regex {
    VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{(env|file):([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },

    #[error("Environment variable not found: {name}")]
    EnvVarNotFound { name: String },

    #[error("Referenced file not found: {path}")]
    FileRefNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Override for one language server, keyed by language id in [`Config::lsp`].
///
/// Unset fields keep the built-in value for that language. A language without
/// a built-in configuration needs both `command` and `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LspServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl LspServerConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            command: other.command.or(self.command),
            args: other.args.or(self.args),
            extensions: other.extensions.or(self.extensions),
            env: merge_hashmap(self.env, other.env),
            enabled: other.enabled.or(self.enabled),
        }
    }

    /// Resolve against the built-in configuration for `language`, if any.
    fn resolve(&self, language: &str, base: Option<&LspConfig>) -> Option<LspConfig> {
        let mut config = match (base, &self.command, &self.extensions) {
            (Some(base), _, _) => base.clone(),
            (None, Some(command), Some(extensions)) => {
                LspConfig::new(language, command.clone(), extensions.clone())
            }
            (None, _, _) => {
                warn!(
                    language,
                    "Ignoring language server override without command and extensions"
                );
                return None;
            }
        };
        if let Some(command) = &self.command {
            config.command = command.clone();
        }
        if let Some(args) = &self.args {
            config.args = args.clone();
        }
        if let Some(extensions) = &self.extensions {
            config.extensions = extensions.clone();
        }
        if let Some(env) = &self.env {
            config.env.extend(env.clone());
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        Some(config)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON Schema reference.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Log level for the symnav crates (e.g. "info", "debug").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Serialization of structured answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,

    /// Answer budget used when a request passes -1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_answer_chars: Option<usize>,

    /// Language server overrides by language id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsp: Option<HashMap<String, LspServerConfig>>,

    /// Tool ids to leave out of the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_tools: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Global config from `~/.config/symnav/`
    /// 2. `SYMNAV_CONFIG_CONTENT` environment variable
    /// 3. Project config from `project_dir`
    pub async fn load(project_dir: Option<&Path>) -> ConfigResult<(Self, Vec<PathBuf>)> {
        Self::load_from(
            Self::global_config_dir().as_deref(),
            std::env::var(CONFIG_CONTENT_ENV).ok(),
            project_dir,
        )
        .await
    }

    /// Load from explicit sources.
    pub async fn load_from(
        global_dir: Option<&Path>,
        env_content: Option<String>,
        project_dir: Option<&Path>,
    ) -> ConfigResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Load global config
        if let Some(global_dir) = global_dir {
            for name in &["config.json", "symnav.json", "symnav.jsonc"] {
                let path = global_dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        // 2. Load from environment variable
        if let Some(content) = env_content {
            let loaded = Self::parse_jsonc(&content, "<env>")?;
            config = config.merge(loaded);
        }

        // 3. Load project config
        if let Some(dir) = project_dir {
            for name in &["symnav.jsonc", "symnav.json"] {
                let path = dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        Ok((config, sources))
    }

    /// Get the global config directory.
    ///
    /// On Unix systems, prefers `~/.config/symnav` over the platform-specific
    /// directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("symnav");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        dirs::config_dir().map(|d| d.join("symnav"))
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::substitute_variables(&content, path)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Parse JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> ConfigResult<Self> {
        let stripped = Self::strip_comments(content);

        serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Strip `//` and `/* */` comments outside of strings.
    fn strip_comments(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(c) = chars.next() {
            if escape_next {
                result.push(c);
                escape_next = false;
                continue;
            }

            if c == '\\' && in_string {
                result.push(c);
                escape_next = true;
                continue;
            }

            if c == '"' {
                in_string = !in_string;
                result.push(c);
                continue;
            }

            if in_string {
                result.push(c);
                continue;
            }

            if c == '/' {
                match chars.peek() {
                    Some('/') => {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == '\n' {
                                result.push('\n');
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = ' ';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            // Keep line numbers stable for error messages
                            if c == '\n' {
                                result.push('\n');
                            }
                            prev = c;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            result.push(c);
        }

        result
    }

    /// Substitute `{env:VAR}` and `{file:path}` placeholders.
    ///
    /// File paths are relative to the config file.
    fn substitute_variables(content: &str, config_path: &Path) -> ConfigResult<String> {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut result = content.to_string();

        for cap in var_regex().captures_iter(content) {
            let (Some(full_match), Some(kind), Some(value)) = (cap.get(0), cap.get(1), cap.get(2))
            else {
                continue;
            };
            let value = value.as_str();

            let replacement = match kind.as_str() {
                "env" => std::env::var(value).map_err(|_| ConfigError::EnvVarNotFound {
                    name: value.to_string(),
                })?,
                "file" => {
                    let file_path = config_dir.join(value);
                    std::fs::read_to_string(&file_path)
                        .map_err(|_| ConfigError::FileRefNotFound {
                            path: file_path.display().to_string(),
                        })?
                        .trim()
                        .to_string()
                }
                _ => continue,
            };

            result = result.replace(full_match.as_str(), &replacement);
        }

        Ok(result)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        if other.schema.is_some() {
            self.schema = other.schema;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.max_answer_chars.is_some() {
            self.max_answer_chars = other.max_answer_chars;
        }
        if other.disabled_tools.is_some() {
            self.disabled_tools = other.disabled_tools;
        }

        self.lsp = match (self.lsp, other.lsp) {
            (Some(mut base), Some(other)) => {
                for (language, server) in other {
                    let merged = match base.remove(&language) {
                        Some(existing) => existing.merge(server),
                        None => server,
                    };
                    base.insert(language, merged);
                }
                Some(base)
            }
            (base, None) => base,
            (None, other) => other,
        };

        self
    }

    /// Operation settings, with command-line values taking precedence.
    pub fn operation_settings(
        &self,
        format: Option<OutputFormat>,
        max_answer_chars: Option<usize>,
    ) -> OperationSettings {
        OperationSettings {
            output_format: format.or(self.output_format).unwrap_or_default(),
            default_max_answer_chars: max_answer_chars
                .or(self.max_answer_chars)
                .unwrap_or(DEFAULT_MAX_ANSWER_CHARS),
        }
    }

    /// Built-in language server configurations with the overrides applied.
    pub fn lsp_configs(&self) -> Vec<LspConfig> {
        let defaults = default_configs();
        let Some(overrides) = &self.lsp else {
            return defaults;
        };

        let mut languages: Vec<&String> = overrides.keys().collect();
        languages.sort();
        let resolved = languages
            .into_iter()
            .filter_map(|language| {
                let base = defaults.iter().find(|c| &c.language == language);
                overrides[language].resolve(language, base)
            })
            .collect();
        apply_overrides(defaults, resolved)
    }

    pub fn disabled_tools(&self) -> &[String] {
        self.disabled_tools.as_deref().unwrap_or_default()
    }
}

/// Merge two HashMaps.
fn merge_hashmap<K: std::hash::Hash + Eq, V>(
    base: Option<HashMap<K, V>>,
    other: Option<HashMap<K, V>>,
) -> Option<HashMap<K, V>> {
    match (base, other) {
        (Some(mut b), Some(o)) => {
            b.extend(o);
            Some(b)
        }
        (b, None) => b,
        (None, o) => o,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // line comment
            "log_level": "debug", /* block
            comment */ "output_format": "json",
            "url": "http://example.com/path"
        }"#;
        let stripped = Config::strip_comments(input);
        let config: Config = serde_json::from_str(&stripped).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert!(stripped.contains("http://example.com/path"));
    }

    #[test]
    fn test_substitute_env_and_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("level.txt"), "debug\n").unwrap();
        std::env::set_var("SYMNAV_TEST_FORMAT", "json");

        let content = r#"{"output_format": "{env:SYMNAV_TEST_FORMAT}", "log_level": "{file:level.txt}"}"#;
        let out = Config::substitute_variables(content, &dir.path().join("symnav.json")).unwrap();
        assert_eq!(out, r#"{"output_format": "json", "log_level": "debug"}"#);
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let err = Config::substitute_variables(
            r#"{"log_level": "{env:SYMNAV_TEST_SURELY_UNSET}"}"#,
            Path::new("symnav.json"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { .. }));
    }

    #[test]
    fn test_merge_later_wins() {
        let base: Config = serde_json::from_value(serde_json::json!({
            "output_format": "json",
            "max_answer_chars": 1000,
            "lsp": {"python": {"command": "pylsp"}}
        }))
        .unwrap();
        let other: Config = serde_json::from_value(serde_json::json!({
            "max_answer_chars": 2000,
            "lsp": {"python": {"args": ["--stdio"]}}
        }))
        .unwrap();

        let merged = base.merge(other);
        assert_eq!(merged.output_format, Some(OutputFormat::Json));
        assert_eq!(merged.max_answer_chars, Some(2000));
        let lsp = merged.lsp.unwrap();
        let python = &lsp["python"];
        assert_eq!(python.command.as_deref(), Some("pylsp"));
        assert_eq!(python.args, Some(vec!["--stdio".to_string()]));
    }

    #[test]
    fn test_operation_settings_precedence() {
        let config = Config {
            output_format: Some(OutputFormat::Json),
            max_answer_chars: Some(500),
            ..Default::default()
        };
        let settings = config.operation_settings(None, None);
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.default_max_answer_chars, 500);

        let settings = config.operation_settings(Some(OutputFormat::Yaml), Some(10));
        assert_eq!(settings.output_format, OutputFormat::Yaml);
        assert_eq!(settings.default_max_answer_chars, 10);

        let settings = Config::default().operation_settings(None, None);
        assert_eq!(settings.output_format, OutputFormat::Yaml);
        assert_eq!(settings.default_max_answer_chars, DEFAULT_MAX_ANSWER_CHARS);
    }

    #[test]
    fn test_lsp_overrides() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "lsp": {
                "python": {"command": "pylsp", "args": []},
                "rust": {"enabled": false},
                "zig": {"command": "zls", "extensions": ["zig"]},
                "cobol": {"command": "cobol-ls"}
            }
        }))
        .unwrap();

        let configs = config.lsp_configs();
        let python = configs.iter().find(|c| c.language == "python").unwrap();
        assert_eq!(python.command, "pylsp");
        assert!(python.args.is_empty());
        assert!(python.handles_extension("py"));

        let rust = configs.iter().find(|c| c.language == "rust").unwrap();
        assert!(!rust.enabled);
        assert!(configs.iter().any(|c| c.language == "zig"));
        assert!(!configs.iter().any(|c| c.language == "cobol"));
    }

    #[tokio::test]
    async fn test_load_from_sources() {
        let global = TempDir::new().unwrap();
        std::fs::write(
            global.path().join("config.json"),
            r#"{"output_format": "json", "max_answer_chars": 100}"#,
        )
        .unwrap();

        let project = TempDir::new().unwrap();
        std::fs::write(
            project.path().join("symnav.jsonc"),
            "{\n  // project settings\n  \"disabled_tools\": [\"rename_symbol\"]\n}",
        )
        .unwrap();

        let (config, sources) = Config::load_from(
            Some(global.path()),
            Some(r#"{"max_answer_chars": 200}"#.to_string()),
            Some(project.path()),
        )
        .await
        .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert_eq!(config.max_answer_chars, Some(200));
        assert_eq!(config.disabled_tools(), ["rename_symbol".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_project_config() {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("symnav.json"), "{ not json").unwrap();
        let err = Config::load_from(None, None, Some(project.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }
}
