#![warn(missing_docs)]

//! # oriel-config
//!
//! Configuration loading for the Oriel workbench backend.
//!
//! Supports TOML configuration files with environment variable expansion.
//!
//! ## Example
//!
//! ```toml
//! [server]
//! listen_addr = "127.0.0.1"
//! port = 18080
//!
//! [roots]
//! workspace = "./workspace"
//! documents = "./documents"
//!
//! [build]
//! cc = "gcc"
//! cxx = "g++"
//! compile_timeout_secs = 30
//! run_timeout_secs = 10
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors from config parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level Oriel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrielConfig {
    /// Session listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Confined root directories.
    #[serde(default)]
    pub roots: RootsSection,

    /// Build and run pipeline settings.
    #[serde(default)]
    pub build: BuildSection,
}

/// Session listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Address the listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum inbound/outbound frame size in kilobytes.
    #[serde(default = "default_max_frame_size_kb")]
    pub max_frame_size_kb: usize,
}

/// Confined root directories.
///
/// The workspace root holds compilable sources and build artifacts; the
/// documents root holds user-saved files for the other sandboxed apps.
/// The two are independent sandboxes — neither may be reached from the
/// other through client-supplied paths.
#[derive(Debug, Clone, Deserialize)]
pub struct RootsSection {
    /// Workspace root directory (created at startup if missing).
    #[serde(default = "default_workspace_root")]
    pub workspace: String,

    /// Documents root directory (created at startup if missing).
    #[serde(default = "default_documents_root")]
    pub documents: String,
}

/// Build and run pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// C compiler program.
    #[serde(default = "default_cc")]
    pub cc: String,

    /// C++ compiler program (used for `.cpp`/`.cxx`/`.cc` sources).
    #[serde(default = "default_cxx")]
    pub cxx: String,

    /// Artifact subdirectory inside the workspace root. Must be a single
    /// bare path component.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Compile deadline in seconds; the compiler is killed past it.
    #[serde(default = "default_compile_timeout_secs")]
    pub compile_timeout_secs: u64,

    /// Run deadline in seconds; the artifact is killed past it.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Per-stream capture cap in kilobytes; output beyond it is truncated.
    #[serde(default = "default_max_output_kb")]
    pub max_output_kb: usize,
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    18080
}

fn default_max_frame_size_kb() -> usize {
    8 * 1024
}

fn default_workspace_root() -> String {
    "./workspace".to_string()
}

fn default_documents_root() -> String {
    "./documents".to_string()
}

fn default_cc() -> String {
    "gcc".to_string()
}

fn default_cxx() -> String {
    "g++".to_string()
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_compile_timeout_secs() -> u64 {
    30
}

fn default_run_timeout_secs() -> u64 {
    10
}

fn default_max_output_kb() -> usize {
    1024
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            max_frame_size_kb: default_max_frame_size_kb(),
        }
    }
}

impl Default for RootsSection {
    fn default() -> Self {
        Self {
            workspace: default_workspace_root(),
            documents: default_documents_root(),
        }
    }
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            cxx: default_cxx(),
            artifact_dir: default_artifact_dir(),
            compile_timeout_secs: default_compile_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            max_output_kb: default_max_output_kb(),
        }
    }
}

impl OrielConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: OrielConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string, expanding `${ENV_VAR}` references.
    pub fn from_toml_with_env(toml_str: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(toml_str);
        Self::from_toml(&expanded)
    }

    /// Load config from a file path, expanding environment variables.
    pub fn from_file_with_env(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_with_env(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be nonzero".into()));
        }
        if self.server.max_frame_size_kb == 0 {
            return Err(ConfigError::Invalid(
                "server.max_frame_size_kb must be nonzero".into(),
            ));
        }
        if self.roots.workspace.is_empty() || self.roots.documents.is_empty() {
            return Err(ConfigError::Invalid(
                "roots.workspace and roots.documents must be non-empty paths".into(),
            ));
        }
        if self.build.cc.is_empty() || self.build.cxx.is_empty() {
            return Err(ConfigError::Invalid(
                "build.cc and build.cxx must be non-empty".into(),
            ));
        }
        // The artifact dir is joined under the workspace root; anything with
        // separators or dot segments could re-anchor it elsewhere.
        let artifact = &self.build.artifact_dir;
        if artifact.is_empty()
            || artifact == "."
            || artifact == ".."
            || artifact.contains('/')
            || artifact.contains('\\')
        {
            return Err(ConfigError::Invalid(format!(
                "build.artifact_dir must be a single bare directory name, got '{artifact}'"
            )));
        }
        if self.build.compile_timeout_secs == 0 || self.build.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "build timeouts must be nonzero".into(),
            ));
        }
        if self.build.max_output_kb == 0 {
            return Err(ConfigError::Invalid(
                "build.max_output_kb must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `${ENV_VAR}` patterns in a string using environment variables.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(value) => result.push_str(&value),
                Err(_) => {
                    // Leave the placeholder if env var not found
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_toml() {
        let config = OrielConfig::from_toml("").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1");
        assert_eq!(config.server.port, 18080);
        assert_eq!(config.roots.workspace, "./workspace");
        assert_eq!(config.roots.documents, "./documents");
        assert_eq!(config.build.cc, "gcc");
        assert_eq!(config.build.cxx, "g++");
        assert_eq!(config.build.artifact_dir, "artifacts");
        assert_eq!(config.build.compile_timeout_secs, 30);
        assert_eq!(config.build.run_timeout_secs, 10);
    }

    #[test]
    fn config_parses_full_example() {
        let toml = r#"
            [server]
            listen_addr = "0.0.0.0"
            port = 9000
            max_frame_size_kb = 512

            [roots]
            workspace = "/srv/oriel/workspace"
            documents = "/srv/oriel/documents"

            [build]
            cc = "clang"
            cxx = "clang++"
            artifact_dir = "out"
            compile_timeout_secs = 60
            run_timeout_secs = 5
            max_output_kb = 256
        "#;

        let config = OrielConfig::from_toml(toml).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_frame_size_kb, 512);
        assert_eq!(config.roots.workspace, "/srv/oriel/workspace");
        assert_eq!(config.build.cc, "clang");
        assert_eq!(config.build.cxx, "clang++");
        assert_eq!(config.build.artifact_dir, "out");
        assert_eq!(config.build.compile_timeout_secs, 60);
        assert_eq!(config.build.run_timeout_secs, 5);
        assert_eq!(config.build.max_output_kb, 256);
    }

    #[test]
    fn config_partial_section_keeps_other_defaults() {
        let toml = r#"
            [build]
            cc = "cc"
        "#;

        let config = OrielConfig::from_toml(toml).unwrap();
        assert_eq!(config.build.cc, "cc");
        assert_eq!(config.build.cxx, "g++");
        assert_eq!(config.server.port, 18080);
    }

    #[test]
    fn config_rejects_zero_port() {
        let toml = r#"
            [server]
            port = 0
        "#;

        let err = OrielConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn config_rejects_empty_roots() {
        let toml = r#"
            [roots]
            workspace = ""
        "#;

        let err = OrielConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("roots"));
    }

    #[test]
    fn config_rejects_artifact_dir_with_separators() {
        for bad in ["../out", "a/b", ".", "..", ""] {
            let toml = format!(
                r#"
                [build]
                artifact_dir = "{bad}"
            "#
            );
            let err = OrielConfig::from_toml(&toml).unwrap_err();
            assert!(
                err.to_string().contains("artifact_dir"),
                "expected artifact_dir error for '{bad}': {err}"
            );
        }
    }

    #[test]
    fn config_rejects_zero_timeouts() {
        let toml = r#"
            [build]
            run_timeout_secs = 0
        "#;

        let err = OrielConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("timeouts"));
    }

    #[test]
    fn config_expands_environment_variables() {
        std::env::set_var("ORIEL_TEST_PORT", "28080");
        let toml = r#"
            [server]
            port = ${ORIEL_TEST_PORT}
        "#;

        let config = OrielConfig::from_toml_with_env(toml).unwrap();
        assert_eq!(config.server.port, 28080);
        std::env::remove_var("ORIEL_TEST_PORT");
    }

    #[test]
    fn env_var_expansion_preserves_unresolved() {
        let result = expand_env_vars("prefix ${DEFINITELY_NOT_SET_12345} suffix");
        assert_eq!(result, "prefix ${DEFINITELY_NOT_SET_12345} suffix");
    }

    #[test]
    fn env_var_expansion_handles_no_vars() {
        let result = expand_env_vars("no variables here");
        assert_eq!(result, "no variables here");
    }

    #[test]
    fn config_loads_from_file() {
        let dir = std::env::temp_dir().join("oriel-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("oriel.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 19090
        "#,
        )
        .unwrap();

        let config = OrielConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 19090);

        std::fs::remove_dir_all(&dir).ok();
    }
}
