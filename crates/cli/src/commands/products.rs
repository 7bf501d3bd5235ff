//! Catalog listing.

use cartwheel_core::Product;
use cartwheel_storefront::ShopState;

/// Print the catalog, the search results for `search`, or the top
/// `bestsellers`.
pub fn list(state: &ShopState, search: Option<&str>, bestsellers: Option<usize>) {
    let products = match (search, bestsellers) {
        (_, Some(limit)) => state.bestsellers(limit),
        (Some(term), None) => state.search_products(term),
        (None, None) => state.products(),
    };

    if products.is_empty() {
        tracing::info!("No products to show");
    }

    #[allow(clippy::print_stdout)]
    {
        for line in render(state, &products) {
            println!("{line}");
        }
    }
}

fn render(state: &ShopState, products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|product| {
            let marker = if product.bestseller { " *" } else { "" };
            let added = product
                .created_at()
                .map_or_else(String::new, |at| at.format("%Y-%m-%d").to_string());
            format!(
                "{:<24} {:>10}  {added:<10}  {}{marker}  [{}]",
                product.id,
                product.price.display(state.currency()),
                product.name,
                product.sizes.join(", ")
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use cartwheel_storefront::testing::InMemoryBackend;
    use cartwheel_storefront::{MemoryTokenStore, StorefrontConfig};

    use super::*;

    #[tokio::test]
    async fn test_render_product_rows() {
        let product = Product {
            name: "Cotton Shirt".to_string(),
            sizes: vec!["S".to_string(), "M".to_string()],
            bestseller: true,
            date: 1_716_634_345_448,
            ..Product::new("shirt1", 20)
        };
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![product]));
        let config = StorefrontConfig::new("http://localhost:4000".parse().unwrap());
        let state = ShopState::new(config, backend, Arc::new(MemoryTokenStore::new()));
        state.load_products().await.unwrap();

        let lines = render(&state, &state.products());

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("shirt1"));
        assert!(lines[0].contains("$20.00"));
        assert!(lines[0].contains("2024-05-25"));
        assert!(lines[0].contains("Cotton Shirt *"));
        assert!(lines[0].ends_with("[S, M]"));
    }
}
