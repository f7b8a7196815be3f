//! Plain text rendering of store state.

use std::fmt::Write as _;

use crate::{
    admin::DashboardMetrics,
    auth::User,
    cart::{helpers::format_item_summary, Cart, Coupon},
    catalog::Product,
    orders::Order,
};

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for item in &cart.items {
        let limit = if item.at_stock_limit() { "  (stock limit)" } else { "" };
        let _ = writeln!(
            out,
            "{:<12} {:<24} {:>3} x {:>10}{limit}",
            item.product.id,
            item.product.name,
            item.quantity,
            money(item.product.price),
        );
    }

    let _ = writeln!(out, "{:>40} {:>12}", "Subtotal", money(cart.subtotal));
    let _ = writeln!(out, "{:>40} {:>12}", "Tax", money(cart.tax));
    if let Some(coupon) = &cart.applied_coupon {
        let _ = writeln!(
            out,
            "{:>40} {:>12}",
            format!("Discount ({})", coupon.code),
            format!("-{}", money(cart.discount))
        );
    }
    let _ = write!(out, "{:>40} {:>12}", "Total", money(cart.total));
    out
}

pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    products
        .iter()
        .map(|product| {
            format!(
                "{:<12} {:<24} {:<12} {:>10}  stock {}",
                product.id,
                product.name,
                product.category,
                money(product.price),
                product.stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn product(product: &Product) -> String {
    let mut out = format!(
        "{} ({})\n{}\nprice {}  stock {}  category {}",
        product.name,
        product.id,
        product.description,
        money(product.price),
        product.stock,
        product.category
    );
    if product.is_active == Some(false) {
        out.push_str("\ninactive");
    }
    out
}

pub fn order_summary(order: &Order) -> String {
    let items: Vec<String> = order
        .items
        .iter()
        .map(|item| format!("{}x {}", item.quantity, item.display_name()))
        .collect();

    format!(
        "{:<26} {:<14} {:>10}  {}",
        order.id,
        order.status.label(),
        money(order.total),
        items.join(", ")
    )
}

pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet".to_string();
    }
    orders.iter().map(order_summary).collect::<Vec<_>>().join("\n")
}

pub fn order(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {}  [{}]", order.id, order.status);
    let _ = writeln!(out, "placed {}", order.created_at);
    if let Some(customer) = &order.user {
        let _ = writeln!(out, "customer {} ({})", customer.name, customer.mobile_number);
    }
    let _ = writeln!(out, "ship to {}", order.shipping_address);

    for item in &order.items {
        let _ = writeln!(
            out,
            "  {:<24} {:>3} x {:>10}",
            item.display_name(),
            item.quantity,
            money(item.price)
        );
    }

    let _ = writeln!(out, "subtotal {}  tax {}", money(order.subtotal), money(order.tax));
    if let Some(coupon) = &order.coupon {
        let _ = writeln!(out, "discount {} ({})", money(order.discount), coupon.code);
    }
    let _ = write!(out, "total {}", money(order.total));
    out
}

pub fn user(user: &User) -> String {
    let mut out = format!(
        "{} <{}>\nmobile {}\nrole {:?}",
        user.name, user.email, user.mobile_number, user.role
    );
    if let Some(address) = &user.address {
        let _ = write!(out, "\naddress {address}");
    }
    if let Some(date_of_birth) = &user.date_of_birth {
        let _ = write!(out, "\nborn {date_of_birth}");
    }
    out
}

pub fn coupons(coupons: &[Coupon]) -> String {
    if coupons.is_empty() {
        return "No coupons".to_string();
    }

    coupons
        .iter()
        .map(|coupon| {
            format!(
                "{:<26} {:<12} {:>5}%  min {:>10}  {} .. {}{}",
                coupon.id,
                coupon.code,
                coupon.discount_percentage,
                money(coupon.minimum_cart_value),
                coupon.start_date,
                coupon.end_date,
                if coupon.is_active { "" } else { "  (inactive)" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dashboard(metrics: &DashboardMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "orders            {}", metrics.total_orders);
    let _ = writeln!(out, "sales             {}", money(metrics.total_sales));
    let _ = writeln!(out, "customers         {}", metrics.total_customers);
    let _ = writeln!(out, "items sold        {}", metrics.total_items_sold);
    let _ = writeln!(out, "in inventory      {}", metrics.products_in_inventory);
    let _ = writeln!(out, "low stock         {}", metrics.low_stock_products);
    let _ = write!(out, "coupon usage      {}", metrics.coupon_usage);

    let mut statuses: Vec<_> = metrics.orders_by_status.iter().collect();
    statuses.sort();
    for (status, count) in statuses {
        let _ = write!(out, "\n  {status:<16}{count}");
    }
    out
}

/// One line confirming a cart change.
pub fn cart_line(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty".to_string();
    }
    format!("{}  total {}", format_item_summary(&cart.items), money(cart.total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cart::CartItem, orders::OrderStatus};
    use serde_json::json;

    fn product(id: &str, name: &str, price: f64, stock: u32) -> Product {
        serde_json::from_value(json!({ "id": id, "name": name, "price": price, "stock": stock }))
            .unwrap()
    }

    fn two_item_cart() -> Cart {
        Cart {
            items: vec![
                CartItem {
                    id: "l1".into(),
                    product: product("p1", "Kettle", 100.0, 1),
                    quantity: 1,
                },
                CartItem {
                    id: "l2".into(),
                    product: product("p2", "Mug", 50.0, 10),
                    quantity: 2,
                },
            ],
            subtotal: 200.0,
            tax: 36.0,
            discount: 0.0,
            total: 236.0,
            applied_coupon: None,
        }
    }

    #[test]
    fn cart_lists_items_and_totals() {
        let text = cart(&two_item_cart());

        assert!(text.contains("Kettle"));
        assert!(text.contains("(stock limit)"));
        assert!(text.contains("236.00"));
        assert!(!text.contains("Discount"));
    }

    #[test]
    fn cart_line_summarizes() {
        assert_eq!(cart_line(&two_item_cart()), "1x Kettle, 2x Mug  total 236.00");
        assert_eq!(cart_line(&Cart::default()), "Cart is empty");
    }

    #[test]
    fn order_summary_uses_item_names() {
        let order: Order = serde_json::from_value(json!({
            "id": "o1",
            "items": [{ "name": "Kettle", "price": 100.0, "quantity": 1 }],
            "status": "Order Placed",
            "total": 118.0
        }))
        .unwrap();

        let line = order_summary(&order);
        assert!(line.contains("Order Placed"));
        assert!(line.contains("1x Kettle"));
        assert_eq!(order.status, OrderStatus::Placed);
    }
}
