//! Read-only smoke test against a running backend.
//!
//! Requires the backend at `FOLIO_API_BASE_URL` (default
//! `http://localhost:8000/api/v1`).
//!
//! Run with: cargo test -p folio-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use folio_client::catalog::Catalog;
use folio_client::comments::{CommentThread, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use folio_client::{ClientConfig, SessionStore};

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_public_listings() {
    let config = ClientConfig::from_env().unwrap();
    let (api, _board) = folio_client::connect(&config, SessionStore::in_memory()).unwrap();

    let mut catalog = Catalog::new(api.clone());
    let snapshot = catalog.load_default().await.unwrap();
    for product in snapshot.products() {
        assert!(product.id.is_positive());
    }

    let mut thread = CommentThread::new(api);
    thread.load(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await.unwrap();
}
