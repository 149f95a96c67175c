//! File-per-URL document store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use url::Url;

use crate::cache::CacheConfig;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How long a cached document may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never changes upstream (archived filing documents).
    Immutable,
    /// Changes upstream; reuse for at most this long.
    Expiring(Duration),
}

/// Persistent cache of raw response bodies, keyed by URL.
///
/// Each URL maps to one file under the cache root
/// (`<host>/<path segments>`). Writes go through a temporary file and an
/// atomic rename, so concurrent readers never observe partial documents.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    root: PathBuf,
}

impl DocumentCache {
    /// Create a store rooted at an initialized cache directory.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            root: config.dir().to_path_buf(),
        }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the cached body for `url`.
    ///
    /// The mapping is injective: every segment is escaped with [`encode`],
    /// so distinct URLs never share a file.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let authority = match url.port() {
            Some(port) => format!("{}:{port}", url.host_str().unwrap_or("local")),
            None => url.host_str().unwrap_or("local").to_string(),
        };
        let mut path = self.root.join(encode(&authority));

        let mut segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .map(|s| if s.is_empty() { EMPTY.to_string() } else { encode(s) })
                    .collect()
            })
            .unwrap_or_default();
        if segments.last().is_none_or(|last| last == EMPTY) {
            segments.pop();
            segments.push(INDEX.to_string());
        }
        if let (Some(query), Some(last)) = (url.query(), segments.last_mut()) {
            last.push_str(QUERY);
            last.push_str(&encode(query));
        }

        for segment in segments {
            path.push(segment);
        }
        path
    }

    /// Read the cached body for `url` if present and still fresh.
    pub async fn get(&self, url: &Url, freshness: Freshness) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(url);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        if let Freshness::Expiring(ttl) = freshness {
            let age = SystemTime::now()
                .duration_since(metadata.modified()?)
                .unwrap_or_default();
            if age >= ttl {
                tracing::debug!(url = %url, age_secs = age.as_secs(), "cached document is stale");
                return Ok(None);
            }
        }

        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `body` as the cached document for `url`.
    pub async fn put(&self, url: &Url, body: &[u8]) -> io::Result<()> {
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(format!(
            ".tmp-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let temp = PathBuf::from(temp);

        if let Err(e) = tokio::fs::write(&temp, body).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        tracing::debug!(url = %url, size = body.len(), "document cached");
        Ok(())
    }
}

// Markers are `_` plus a non-hex letter, so they never read as an escape.
const EMPTY: &str = "_N";
const INDEX: &str = "_I";
const QUERY: &str = "_Q";

/// Escape a URL component into a file name.
///
/// ASCII letters, digits, `.` and `-` are kept; every other byte becomes
/// `_XX`. The `.` and `..` names are escaped whole.
fn encode(component: &str) -> String {
    if component == "." || component == ".." {
        return "_2E".repeat(component.len());
    }

    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}
