#![warn(missing_docs)]

//! Oriel workbench backend daemon.
//!
//! One process serves every desktop session: confined file operations,
//! shell verbs, and the native compile/run pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use oriel_build::{BuildConfig, BuildService};
use oriel_config::OrielConfig;
use oriel_server::{Services, SessionServer};
use oriel_vfs::{ConfinedRoot, FileService, ShellService};
use tracing_subscriber::EnvFilter;

/// Subdirectories scaffolded under the documents root at startup, so the
/// desktop apps find their expected folders on first run.
const DOCUMENT_SCAFFOLD: &[&str] = &["notes", "documents", "projects"];

/// Locate the config file.
///
/// Search order:
/// 1. `ORIEL_CONFIG` environment variable
/// 2. `./oriel.toml` in the current directory
/// 3. None (no config file found — not an error, defaults apply)
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ORIEL_CONFIG") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }

    let cwd = PathBuf::from("oriel.toml");
    if cwd.exists() {
        return Some(cwd);
    }

    None
}

/// Build the pipeline config from the loaded file config.
fn build_config(config: &OrielConfig) -> BuildConfig {
    BuildConfig {
        cc: config.build.cc.clone(),
        cxx: config.build.cxx.clone(),
        artifact_dir: config.build.artifact_dir.clone(),
        compile_timeout: Duration::from_secs(config.build.compile_timeout_secs),
        run_timeout: Duration::from_secs(config.build.run_timeout_secs),
        max_output_size: config.build.max_output_kb * 1024,
    }
}

/// Create the expected folder structure under the documents root.
///
/// Failures are logged and startup proceeds — a missing subfolder only
/// degrades the first-run experience of the desktop apps.
fn scaffold_documents(documents: &ConfinedRoot) {
    for name in DOCUMENT_SCAFFOLD {
        if let Err(e) = std::fs::create_dir_all(documents.path().join(name)) {
            tracing::warn!(folder = name, error = %e, "failed to scaffold documents folder");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --version / -V before anything else
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("orield {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config = match find_config_file() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            OrielConfig::from_file_with_env(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => {
            tracing::info!("no config file found, using defaults");
            OrielConfig::default()
        }
    };

    // Open the confined roots (created if missing)
    let workspace = ConfinedRoot::open("workspace", &config.roots.workspace)
        .with_context(|| format!("failed to open workspace root '{}'", config.roots.workspace))?;
    let documents = ConfinedRoot::open("documents", &config.roots.documents)
        .with_context(|| format!("failed to open documents root '{}'", config.roots.documents))?;
    scaffold_documents(&documents);

    let services = Services {
        files: FileService::new(documents.clone()),
        shell: ShellService::new(workspace.clone()),
        build: BuildService::new(workspace.clone(), documents.clone(), build_config(&config)),
    };

    let addr = format!("{}:{}", config.server.listen_addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind session listener on {addr}"))?;

    tracing::info!(
        %addr,
        workspace = %workspace.path().display(),
        documents = %documents.path().display(),
        "oriel backend listening"
    );

    let server = SessionServer::new(services, config.server.max_frame_size_kb * 1024);

    tokio::select! {
        result = server.serve(listener) => {
            result.context("session listener failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal, stopping gracefully");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_config_converts_units() {
        let mut config = OrielConfig::default();
        config.build.compile_timeout_secs = 7;
        config.build.run_timeout_secs = 3;
        config.build.max_output_kb = 2;

        let built = build_config(&config);
        assert_eq!(built.compile_timeout, Duration::from_secs(7));
        assert_eq!(built.run_timeout, Duration::from_secs(3));
        assert_eq!(built.max_output_size, 2048);
        assert_eq!(built.cc, "gcc");
    }

    #[test]
    fn scaffold_creates_expected_folders() {
        let dir = tempfile::tempdir().unwrap();
        let documents = ConfinedRoot::open("documents", dir.path()).unwrap();

        scaffold_documents(&documents);

        for name in DOCUMENT_SCAFFOLD {
            assert!(documents.path().join(name).is_dir(), "missing {name}");
        }
    }

    #[test]
    fn find_config_prefers_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "").unwrap();

        std::env::set_var("ORIEL_CONFIG", &path);
        let found = find_config_file();
        std::env::remove_var("ORIEL_CONFIG");

        assert_eq!(found, Some(path));
    }
}
