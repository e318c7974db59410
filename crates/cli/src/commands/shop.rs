//! Shop commands: catalog, cart, checkout, orders.

use folio_client::HttpTransport;
use folio_client::cart::CartController;
use folio_client::catalog::Catalog;
use folio_client::checkout::{CheckoutFlow, ShippingDetails};
use folio_client::orders::OrderBook;
use folio_core::{OrderId, ProductId};
use tracing::info;

use super::{CliError, Context, report_refresh};

pub async fn products(
    ctx: &Context,
    search: &str,
    category: Option<&str>,
) -> Result<(), CliError> {
    let mut catalog = Catalog::new(ctx.api.clone());
    let snapshot = catalog.load_default().await?;

    let matches = snapshot.filter(search, category);
    if matches.is_empty() {
        info!("No products found");
    }
    for product in matches {
        let stock = if product.in_stock() {
            format!("{} in stock", product.stock)
        } else {
            "out of stock".to_string()
        };
        info!(
            "#{} {} - {} ({stock}){}",
            product.id,
            product.name,
            product.price,
            product
                .category
                .as_deref()
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    let mut catalog = Catalog::new(ctx.api.clone());
    for category in catalog.load_default().await?.categories() {
        info!("{category}");
    }
    Ok(())
}

async fn print_cart(cart: &mut CartController<HttpTransport>) -> Result<(), CliError> {
    let mirror = cart.refresh().await?;
    if mirror.is_empty() {
        info!("Your cart is empty");
        return Ok(());
    }
    for line in mirror.lines() {
        info!(
            "#{} {} x{} @ {} = {}",
            line.product_id,
            line.product_name,
            line.quantity,
            line.price,
            line.line_total()
        );
    }
    let totals = mirror.totals();
    info!("{} items, subtotal {}", totals.item_count, totals.subtotal);
    Ok(())
}

pub async fn show_cart(ctx: &Context) -> Result<(), CliError> {
    ctx.api.session().require_user().await?;
    print_cart(&mut CartController::new(ctx.api.clone())).await
}

pub async fn add_to_cart(
    ctx: &Context,
    product: ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    let mut catalog = Catalog::new(ctx.api.clone());
    let snapshot = catalog.load_default().await?;

    let mut cart = CartController::new(ctx.api.clone());
    let added = cart.add_item(snapshot, product, quantity).await;
    report_refresh(&ctx.settle(added, "Added to cart")?);
    Ok(())
}

pub async fn set_quantity(
    ctx: &Context,
    product: ProductId,
    quantity: i64,
) -> Result<(), CliError> {
    let mut cart = CartController::new(ctx.api.clone());
    let updated = cart.set_quantity(product, quantity).await;
    let text = if quantity < 1 {
        "Removed from cart"
    } else {
        "Cart updated"
    };
    report_refresh(&ctx.settle(updated, text)?);
    Ok(())
}

pub async fn remove_from_cart(ctx: &Context, product: ProductId) -> Result<(), CliError> {
    let mut cart = CartController::new(ctx.api.clone());
    let removed = cart.remove_item(product).await;
    report_refresh(&ctx.settle(removed, "Removed from cart")?);
    Ok(())
}

pub async fn checkout(
    ctx: &Context,
    address: &str,
    phone: &str,
    remark: Option<&str>,
) -> Result<(), CliError> {
    ctx.api.session().require_user().await?;

    let mut cart = CartController::new(ctx.api.clone());
    let mut orders = OrderBook::new(ctx.api.clone());
    let mut flow = CheckoutFlow::new(ctx.api.clone(), ctx.notices.clone());

    let summary = flow.open(cart.refresh().await?)?;
    for line in &summary.lines {
        info!(
            "{} x{} = {}",
            line.product_name,
            line.quantity,
            line.line_total
        );
    }
    info!("Estimated total {}", summary.estimated_total());

    let details = ShippingDetails::new(address, phone, remark);
    let refreshed = flow.submit(details, &mut cart, &mut orders).await?;
    ctx.announce();
    report_refresh(&refreshed);
    Ok(())
}

pub async fn list_orders(ctx: &Context) -> Result<(), CliError> {
    ctx.api.session().require_user().await?;

    let mut book = OrderBook::new(ctx.api.clone());
    let orders = book.load().await?;
    if orders.is_empty() {
        info!("No orders yet");
    }
    for order in orders {
        info!(
            "Order #{} [{}] {} placed {}",
            order.id,
            order.status,
            order.total_amount,
            order.placed_on()
        );
        for item in &order.items {
            info!(
                "    {} x{} = {}",
                item.product_name,
                item.quantity,
                item.total_price
            );
        }
    }
    Ok(())
}

pub async fn cancel_order(ctx: &Context, order: OrderId) -> Result<(), CliError> {
    ctx.api.session().require_user().await?;

    let mut book = OrderBook::new(ctx.api.clone());
    book.load().await?;

    let flow = CheckoutFlow::new(ctx.api.clone(), ctx.notices.clone());
    let refreshed = flow.cancel(&mut book, order).await?;
    ctx.announce();
    report_refresh(&refreshed);
    Ok(())
}
