//! Cart commands.

use cartwheel_core::{ProductId, Size};
use cartwheel_storefront::ShopState;

use super::CliError;

/// Print each cart line and the order totals.
///
/// Lines are printed even when totals cannot be computed, for example when
/// the cart still holds a product the catalog no longer lists.
pub fn show(state: &ShopState) {
    #[allow(clippy::print_stdout)]
    {
        for line in render_cart(state) {
            println!("{line}");
        }
    }
}

/// Add one unit and wait for the backend mirror when signed in.
pub async fn add(state: &ShopState, product_id: &str, size: &str) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id);
    match state.product(product_id.as_str()) {
        None => tracing::warn!(product_id = %product_id, "Product is not in the catalog"),
        Some(product) if !product.sizes.is_empty() && !product.offers_size(size) => {
            tracing::warn!(product_id = %product_id, size, "Product is not sold in this size");
        }
        Some(_) => {}
    }

    state.add_to_cart(&product_id, size).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{product_id} ({size}) x{}",
            state.cart_items().quantity(product_id.as_str(), size)
        );
    }
    Ok(())
}

/// Overwrite a quantity and wait for the background mirror to finish.
pub async fn update(
    state: &ShopState,
    product_id: &str,
    size: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let size = Size::parse(size).map_err(|_| CliError::InvalidArgument {
        field: "size",
        reason: "must not be empty",
    })?;
    let product_id = ProductId::new(product_id);

    if let Some(sync) = state.update_quantity(&product_id, &size, quantity)? {
        sync.await?;
    }

    #[allow(clippy::print_stdout)]
    {
        println!("{product_id} ({size}) x{quantity}");
    }
    Ok(())
}

fn render_cart(state: &ShopState) -> Vec<String> {
    let mut out = render_lines(state);
    if out.is_empty() {
        out.push("Your cart is empty.".to_string());
    }
    out.push(format!("Items:    {}", state.cart_count()));

    match state.cart_totals() {
        Ok(totals) => {
            out.push(format!("Subtotal: {}", state.format_price(totals.subtotal)));
            out.push(format!("Shipping: {}", state.format_price(totals.shipping)));
            out.push(format!("Total:    {}", state.format_price(totals.total)));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cart totals unavailable");
            out.push(e.user_message());
        }
    }
    out
}

fn render_lines(state: &ShopState) -> Vec<String> {
    state
        .cart_lines()
        .into_iter()
        .map(|entry| {
            let name = entry
                .product
                .as_ref()
                .map_or("(unavailable)", |p| p.name.as_str());
            let total = entry
                .line_total()
                .map_or_else(|| "-".to_string(), |t| state.format_price(t));
            format!(
                "{:<24} {:<4} x{:<3} {:>10}  {name}",
                entry.line.product_id, entry.line.size, entry.line.quantity, total
            )
        })
        .collect()
}
