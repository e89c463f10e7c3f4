//! Language server configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for a language server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LspConfig {
    /// Language identifier (e.g., "rust", "typescript").
    pub language: String,

    /// File extensions handled by this server.
    pub extensions: Vec<String>,

    /// Command to run the server.
    pub command: String,

    /// Arguments for the command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Whether the server is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl LspConfig {
    /// Create a new LSP configuration.
    pub fn new(
        language: impl Into<String>,
        command: impl Into<String>,
        extensions: Vec<impl Into<String>>,
    ) -> Self {
        Self {
            language: language.into(),
            extensions: extensions.into_iter().map(|e| e.into()).collect(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            enabled: true,
        }
    }

    /// Add command arguments.
    pub fn with_args(mut self, args: Vec<impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn rust() -> Self {
        Self::new("rust", "rust-analyzer", vec!["rs"])
    }

    pub fn typescript() -> Self {
        Self::new(
            "typescript",
            "typescript-language-server",
            vec!["ts", "tsx", "js", "jsx", "mjs", "cjs"],
        )
        .with_args(vec!["--stdio"])
    }

    pub fn python() -> Self {
        Self::new("python", "pyright-langserver", vec!["py", "pyi"]).with_args(vec!["--stdio"])
    }

    pub fn go() -> Self {
        Self::new("go", "gopls", vec!["go"])
    }

    pub fn cpp() -> Self {
        Self::new(
            "cpp",
            "clangd",
            vec!["c", "cpp", "cc", "cxx", "h", "hpp", "hxx"],
        )
    }

    pub fn java() -> Self {
        Self::new("java", "jdtls", vec!["java"])
    }

    pub fn csharp() -> Self {
        Self::new("csharp", "csharp-ls", vec!["cs"])
    }

    pub fn ruby() -> Self {
        Self::new("ruby", "solargraph", vec!["rb", "rake"]).with_args(vec!["stdio"])
    }

    pub fn php() -> Self {
        Self::new("php", "intelephense", vec!["php"]).with_args(vec!["--stdio"])
    }

    pub fn kotlin() -> Self {
        Self::new("kotlin", "kotlin-language-server", vec!["kt", "kts"])
    }

    pub fn lua() -> Self {
        Self::new("lua", "lua-language-server", vec!["lua"])
    }

    /// Check whether this server handles the given extension.
    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Check whether this server handles the given file.
    pub fn handles_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.handles_extension(ext))
    }
}

/// Default configurations for common languages.
pub fn default_configs() -> Vec<LspConfig> {
    vec![
        LspConfig::rust(),
        LspConfig::typescript(),
        LspConfig::python(),
        LspConfig::go(),
        LspConfig::cpp(),
        LspConfig::java(),
        LspConfig::csharp(),
        LspConfig::ruby(),
        LspConfig::php(),
        LspConfig::kotlin(),
        LspConfig::lua(),
    ]
}

/// Apply user overrides on top of a set of configurations.
///
/// An override replaces the configuration with the same language, or is
/// appended when the language is new.
pub fn apply_overrides(mut configs: Vec<LspConfig>, overrides: Vec<LspConfig>) -> Vec<LspConfig> {
    for config in overrides {
        match configs.iter_mut().find(|c| c.language == config.language) {
            Some(existing) => *existing = config,
            None => configs.push(config),
        }
    }
    configs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_config() {
        let config = LspConfig::rust();
        assert_eq!(config.language, "rust");
        assert_eq!(config.command, "rust-analyzer");
        assert!(config.handles_extension("rs"));
        assert!(config.handles_extension("RS"));
        assert!(!config.handles_extension("py"));
    }

    #[test]
    fn test_handles_file() {
        let config = LspConfig::typescript();
        assert!(config.handles_file(Path::new("src/app.tsx")));
        assert!(!config.handles_file(Path::new("Makefile")));
    }

    #[test]
    fn test_apply_overrides() {
        let custom = LspConfig::new("rust", "ra-multiplex", vec!["rs"]).with_args(vec!["client"]);
        let extra = LspConfig::new("zig", "zls", vec!["zig"]);

        let configs = apply_overrides(default_configs(), vec![custom, extra]);
        let rust = configs.iter().find(|c| c.language == "rust").unwrap();
        assert_eq!(rust.command, "ra-multiplex");
        assert_eq!(rust.args, vec!["client"]);
        assert!(configs.iter().any(|c| c.language == "zig"));
        assert_eq!(configs.len(), default_configs().len() + 1);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: LspConfig = serde_json::from_str(
            r#"{"language": "go", "extensions": ["go"], "command": "gopls"}"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert!(config.args.is_empty());
    }
}
