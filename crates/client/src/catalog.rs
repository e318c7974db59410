//! Catalog View: the product list and a client-side filter over it.

use folio_core::{Money, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiClient, null_as_default};
use crate::endpoints;
use crate::error::ApiError;
use crate::transport::Transport;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// A product as listed by the backend. Server-owned and read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// The last product list fetched, and the only stock information the client has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSnapshot {
    products: Vec<Product>,
}

impl ProductSnapshot {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products matching `search` (case-insensitive, name or description)
    /// and `category` (exact). Blank criteria match everything.
    #[must_use]
    pub fn filter(&self, search: &str, category: Option<&str>) -> Vec<&Product> {
        let needle = search.trim().to_lowercase();
        let category = category.filter(|c| !c.is_empty());

        self.products
            .iter()
            .filter(|p| needle.is_empty() || p.matches_search(&needle))
            .filter(|p| category.is_none_or(|c| p.category.as_deref() == Some(c)))
            .collect()
    }

    /// Distinct non-empty categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for category in self.products.iter().filter_map(|p| p.category.as_deref()) {
            if !category.is_empty() && !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen
    }
}

/// Loads the product list into a [`ProductSnapshot`].
#[derive(Debug)]
pub struct Catalog<T> {
    api: ApiClient<T>,
    snapshot: ProductSnapshot,
}

impl<T: Transport> Catalog<T> {
    #[must_use]
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            snapshot: ProductSnapshot::default(),
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> &ProductSnapshot {
        &self.snapshot
    }

    /// Fetch one page of products, replacing the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request; the snapshot is kept on failure.
    #[instrument(skip(self))]
    pub async fn load(&mut self, page: u32, page_size: u32) -> Result<&ProductSnapshot, ApiError> {
        let products: Vec<Product> = self
            .api
            .fetch_list(&endpoints::products(page, page_size))
            .await?;
        debug!(count = products.len(), "catalog loaded");
        self.snapshot = ProductSnapshot::new(products);
        Ok(&self.snapshot)
    }

    /// [`Self::load`] with the default page.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request.
    pub async fn load_default(&mut self) -> Result<&ProductSnapshot, ApiError> {
        self.load(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::api::Method;
    use crate::session::SessionStore;
    use crate::transport::scripted::ScriptedTransport;

    pub(crate) fn product(id: i64, name: &str, price: Decimal, stock: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: None,
            price: Money::new(price),
            stock,
            category: None,
            image_url: None,
        }
    }

    fn snapshot() -> ProductSnapshot {
        let mut mug = product(1, "Blue Mug", Decimal::new(1250, 2), 5);
        mug.category = Some("Kitchen".to_string());
        mug.description = Some("Ceramic, dishwasher safe".to_string());
        let mut poster = product(2, "Poster", Decimal::new(800, 2), 0);
        poster.category = Some("Art".to_string());
        let mut plate = product(3, "Plate", Decimal::new(900, 2), 2);
        plate.category = Some("Kitchen".to_string());
        ProductSnapshot::new(vec![mug, poster, plate])
    }

    #[test]
    fn test_filter_by_search_and_category() {
        let snapshot = snapshot();

        let ids = |found: Vec<&Product>| found.iter().map(|p| p.id.as_i64()).collect::<Vec<_>>();
        assert_eq!(ids(snapshot.filter("", None)), vec![1, 2, 3]);
        assert_eq!(ids(snapshot.filter("MUG", None)), vec![1]);
        assert_eq!(ids(snapshot.filter("ceramic", None)), vec![1]);
        assert_eq!(ids(snapshot.filter("", Some("Kitchen"))), vec![1, 3]);
        assert_eq!(ids(snapshot.filter("p", Some("Art"))), vec![2]);
        assert!(snapshot.filter("lamp", None).is_empty());
    }

    #[test]
    fn test_categories_are_distinct_in_order() {
        assert_eq!(snapshot().categories(), vec!["Kitchen", "Art"]);
    }

    #[test]
    fn test_product_tolerates_nulls() {
        let product: Product = serde_json::from_value(json!({
            "id": 4,
            "name": "Pen",
            "price": null,
            "stock": null,
            "category": null,
        }))
        .unwrap();
        assert_eq!(product.price, Money::ZERO);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_product_price_from_string() {
        let product: Product =
            serde_json::from_value(json!({ "id": 4, "name": "Pen", "price": "3.50", "stock": 1 }))
                .unwrap();
        assert_eq!(product.price, Money::new(Decimal::new(350, 2)));
    }

    #[tokio::test]
    async fn test_load_replaces_snapshot() {
        let transport = ScriptedTransport::new();
        transport
            .respond_ok(
                Method::Get,
                "/products?page=1&page_size=100",
                json!([{ "id": 1, "name": "Mug", "price": 12.5, "stock": 3 }]),
            )
            .respond_ok(Method::Get, "/products?page=1&page_size=100", json!(null));

        let api = ApiClient::new(
            transport.clone(),
            "http://h/api/v1",
            SessionStore::in_memory(),
        );
        let mut catalog = Catalog::new(api);

        assert_eq!(catalog.load_default().await.unwrap().products().len(), 1);
        assert!(catalog.snapshot().find(ProductId::new(1)).unwrap().in_stock());

        assert!(catalog.load_default().await.unwrap().is_empty());
    }
}
