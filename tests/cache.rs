use std::time::Duration;

use url::Url;

use sec_edgar_client::cache::{self, DocumentCache, Freshness};
use sec_edgar_client::error::CacheInitError;

#[test]
fn test_initialize_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("sec-edgar");
    let dir = dir.to_str().unwrap();

    let first = cache::initialize(dir).unwrap();
    std::fs::write(first.dir().join("keep.json"), b"{}").unwrap();
    let second = cache::initialize(dir).unwrap();

    assert_eq!(first, second);
    assert!(second.dir().join("keep.json").exists());
}

#[test]
fn test_initialize_under_a_file_fails() {
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let nested = blocker.join("cache");
    let err = cache::initialize(nested.to_str().unwrap()).unwrap_err();

    assert!(matches!(err, CacheInitError::Create { .. }));
}

#[tokio::test]
async fn test_documents_survive_a_new_store() {
    let root = tempfile::tempdir().unwrap();
    let url = Url::parse("https://www.sec.gov/Archives/edgar/data/1/0000000001-24-000001.txt").unwrap();

    let config = cache::initialize(root.path().to_str().unwrap()).unwrap();
    DocumentCache::new(&config).put(&url, b"filing text").await.unwrap();

    let reopened = DocumentCache::new(&cache::initialize(root.path().to_str().unwrap()).unwrap());
    let immutable = reopened.get(&url, Freshness::Immutable).await.unwrap();
    let expiring = reopened
        .get(&url, Freshness::Expiring(Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(immutable.as_deref(), Some(&b"filing text"[..]));
    assert_eq!(expiring, immutable);
}
