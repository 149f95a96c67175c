//! Local on-disk cache for fetched SEC documents.
//!
//! [`initialize`] prepares the cache directory and must run before the HTTP
//! layer is configured, so every later fetch can be served from disk when a
//! fresh copy exists.
//!
//! ```rust,no_run
//! use sec_edgar_client::cache::{self, DocumentCache};
//!
//! # fn run() -> Result<(), sec_edgar_client::error::CacheInitError> {
//! let config = cache::initialize("~/.cache/sec-edgar")?;
//! let documents = DocumentCache::new(&config);
//! println!("caching under {}", documents.root().display());
//! # Ok(())
//! # }
//! ```

mod store;

use std::path::{Path, PathBuf};

pub use store::{DocumentCache, Freshness};

use crate::error::CacheInitError;

const WRITE_PROBE: &str = ".write-probe";

/// A resolved, existing, writable cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    dir: PathBuf,
}

impl CacheConfig {
    /// Absolute path of the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Resolve, create and verify the cache directory.
///
/// `~` is expanded to the user's home directory and relative paths are
/// resolved against the current directory. Calling this repeatedly with the
/// same path is harmless; existing contents are left untouched.
pub fn initialize(cache_dir: &str) -> Result<CacheConfig, CacheInitError> {
    let dir = resolve(cache_dir)?;

    std::fs::create_dir_all(&dir).map_err(|source| CacheInitError::Create {
        path: dir.clone(),
        source,
    })?;

    let probe = dir.join(WRITE_PROBE);
    std::fs::write(&probe, b"ok")
        .and_then(|()| std::fs::remove_file(&probe))
        .map_err(|source| CacheInitError::NotWritable {
            path: dir.clone(),
            source,
        })?;

    tracing::info!(path = %dir.display(), "cache directory ready");
    Ok(CacheConfig { dir })
}

fn resolve(cache_dir: &str) -> Result<PathBuf, CacheInitError> {
    let expanded = shellexpand::tilde_with_context(cache_dir.trim(), || {
        etcetera::home_dir()
            .ok()
            .map(|home| home.to_string_lossy().into_owned())
    });
    if expanded.starts_with('~') {
        return Err(CacheInitError::NoHomeDirectory {
            path: cache_dir.to_string(),
        });
    }

    let path = PathBuf::from(expanded.as_ref());
    std::path::absolute(&path).map_err(|source| CacheInitError::Create { path, source })
}
