//! Client configuration loaded from environment variables.
//!
//! - `BRIGHTPATH_BACKEND_URL` (required) - base URL of the course backend
//! - `BRIGHTPATH_STORAGE_URL` - durable local store (default: `sqlite://brightpath.db`)
//! - `BRIGHTPATH_DOWNLOAD_DIR` - where downloaded resources land (default: `.`)
//! - `RUST_LOG` - log filter (default: `brightpath=info`)
//!
//! Any of these may also come from a `.env` file.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const DEFAULT_STORAGE_URL: &str = "sqlite://brightpath.db";
const DEFAULT_LOG_FILTER: &str = "brightpath=info";

/// Load `.env` (from `env_file`, or the usual search from the working
/// directory) and return the log filter. Must run before the subscriber is
/// built so a `RUST_LOG` from `.env` is seen.
pub fn load_env(env_file: Option<&Path>) -> String {
    let loaded = match env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let Err(e) = loaded
        && !e.not_found()
    {
        eprintln!("ignoring unreadable .env: {}", e);
    }
    env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub backend_url: String,
    pub storage_url: String,
    pub download_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url.into()),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            download_dir: PathBuf::from("."),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let backend_url = env::var("BRIGHTPATH_BACKEND_URL")
            .map_err(|_| AppError::Config("BRIGHTPATH_BACKEND_URL is not set".to_string()))?;
        if backend_url.trim().is_empty() {
            return Err(AppError::Config("BRIGHTPATH_BACKEND_URL is empty".to_string()));
        }

        let storage_url =
            env::var("BRIGHTPATH_STORAGE_URL").unwrap_or_else(|_| DEFAULT_STORAGE_URL.to_string());
        let download_dir = env::var("BRIGHTPATH_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self {
            backend_url: normalize_base_url(backend_url),
            storage_url,
            download_dir,
        })
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
