//! Subcommand execution.

use tracing::info;

use super::{render, AdminCommand, CartCommand, CliError, Command, CouponCommand, OrderCommand};
use crate::{
    admin::CouponInput,
    auth::{Credentials, ProfileUpdate, Registration},
    catalog::models::ALL_CATEGORIES,
    storefront::Storefront,
};

/// Runs `command` and prints its result.
pub async fn execute(storefront: &Storefront, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login {
            mobile_number,
            password,
            admin,
        } => {
            let credentials = Credentials {
                mobile_number,
                password,
            };
            let user = if admin {
                storefront.auth.login_admin(&credentials).await?
            } else {
                storefront.auth.login(&credentials).await?
            };
            println!("{}", render::user(&user));
            print_token(storefront).await;
        }
        Command::Register {
            name,
            email,
            mobile_number,
            password,
            address,
            date_of_birth,
        } => {
            let registration = Registration {
                name,
                email,
                mobile_number,
                password,
                address,
                date_of_birth,
            };
            let user = storefront.auth.register(&registration).await?;
            println!("{}", render::user(&user));
            print_token(storefront).await;
        }
        Command::Profile {
            name,
            email,
            address,
            date_of_birth,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                address,
                date_of_birth,
            };
            let user = if is_empty_update(&update) {
                storefront.auth.fetch_profile().await?
            } else {
                storefront.auth.update_profile(&update).await?
            };
            println!("{}", render::user(&user));
        }
        Command::Products {
            category,
            min_price,
            max_price,
        } => {
            let catalog = &storefront.catalog;
            catalog.fetch_products().await?;
            catalog
                .filter_by_category(category.as_deref().unwrap_or(ALL_CATEGORIES))
                .await;
            let products = catalog
                .filter_by_price(min_price.unwrap_or(0.0), max_price.unwrap_or(f64::INFINITY))
                .await;
            println!("{}", render::products(&products));
        }
        Command::Product { product_id } => {
            let product = storefront.catalog.fetch_product(&product_id).await?;
            println!("{}", render::product(&product));
        }
        Command::Categories => {
            for category in storefront.catalog.fetch_categories().await? {
                println!("{category}");
            }
        }
        Command::Cart { command } => cart(storefront, command).await?,
        Command::Coupon { command } => coupon(storefront, command).await?,
        Command::Orders { command } => orders(storefront, command).await?,
        Command::Admin { command } => admin(storefront, command).await?,
    }

    Ok(())
}

async fn cart(storefront: &Storefront, command: CartCommand) -> Result<(), CliError> {
    let store = &storefront.cart;

    match command {
        CartCommand::Show => {
            let cart = store.fetch_cart().await?;
            println!("{}", render::cart(&cart));
        }
        CartCommand::Add {
            product_id,
            quantity,
        } => {
            let cart = store.add_item(&product_id, quantity).await?;
            println!("{}", render::cart_line(&cart));
        }
        CartCommand::Update {
            product_id,
            quantity,
        } => {
            let cart = store.update_item_quantity(&product_id, quantity).await?;
            println!("{}", render::cart_line(&cart));
        }
        CartCommand::Remove { product_id } => {
            let cart = store.remove_item(&product_id).await?;
            println!("{}", render::cart_line(&cart));
        }
        CartCommand::Clear => {
            store.clear_cart().await?;
            println!("Cart is empty");
        }
    }

    Ok(())
}

async fn coupon(storefront: &Storefront, command: CouponCommand) -> Result<(), CliError> {
    let store = &storefront.cart;

    // Coupon rules compare against the applied coupon, so load the cart first.
    store.fetch_cart().await?;

    let cart = match command {
        CouponCommand::Apply { code } => store.apply_coupon(&code).await?,
        CouponCommand::Remove => store.remove_coupon().await?,
    };
    println!("{}", render::cart(&cart));

    Ok(())
}

async fn orders(storefront: &Storefront, command: OrderCommand) -> Result<(), CliError> {
    let store = &storefront.orders;

    match command {
        OrderCommand::List => {
            let orders = store.fetch_orders().await?;
            println!("{}", render::orders(&orders));
        }
        OrderCommand::Show { order_id } => {
            let order = store.fetch_order(&order_id).await?;
            println!("{}", render::order(&order));
        }
        OrderCommand::Place { address } => {
            if storefront.cart.fetch_cart().await?.is_empty() {
                return Err(CliError::EmptyCart);
            }

            let address = match address.filter(|address| !address.trim().is_empty()) {
                Some(address) => address,
                None => storefront
                    .auth
                    .fetch_profile()
                    .await?
                    .address
                    .filter(|address| !address.trim().is_empty())
                    .ok_or(CliError::MissingAddress)?,
            };

            let order = store.place_order(Some(address)).await?;
            println!("{}", render::order(&order));
        }
        OrderCommand::Cancel { order_id } => {
            let order = store.fetch_order(&order_id).await?;
            if !order.status.is_cancellable() {
                return Err(CliError::NotCancellable {
                    order_id,
                    status: order.status,
                });
            }

            let order = store.cancel_order(&order_id).await?;
            println!("{}", render::order_summary(&order));
        }
    }

    Ok(())
}

async fn admin(storefront: &Storefront, command: AdminCommand) -> Result<(), CliError> {
    match command {
        AdminCommand::Orders => {
            let orders = storefront.admin_orders.fetch_orders().await?;
            println!("{}", render::orders(&orders));
        }
        AdminCommand::SetStatus { order_id, status } => {
            storefront.admin_orders.update_status(&order_id, status).await?;
            println!("{order_id} -> {status}");
        }
        AdminCommand::Coupons => {
            let coupons = storefront.admin_coupons.fetch_coupons().await?;
            println!("{}", render::coupons(&coupons));
        }
        AdminCommand::CreateCoupon {
            code,
            discount_percentage,
            minimum_cart_value,
            start_date,
            end_date,
            inactive,
        } => {
            let input = CouponInput {
                code: code.trim().to_uppercase(),
                discount_percentage,
                minimum_cart_value,
                start_date,
                end_date,
                is_active: !inactive,
            };
            let coupon = storefront.admin_coupons.create_coupon(&input).await?;
            println!("{}", render::coupons(std::slice::from_ref(&coupon)));
        }
        AdminCommand::DeleteCoupon { coupon_id } => {
            storefront.admin_coupons.delete_coupon(&coupon_id).await?;
            println!("deleted {coupon_id}");
        }
        AdminCommand::Products => {
            let products = storefront.admin_products.fetch_products().await?;
            println!("{}", render::products(&products));
        }
        AdminCommand::Dashboard => {
            let metrics = storefront.dashboard.fetch_metrics().await?;
            println!("{}", render::dashboard(&metrics));
        }
    }

    Ok(())
}

fn is_empty_update(update: &ProfileUpdate) -> bool {
    update.name.is_none()
        && update.email.is_none()
        && update.address.is_none()
        && update.date_of_birth.is_none()
}

/// Prints the token so it can be exported for later commands.
async fn print_token(storefront: &Storefront) {
    if let Some(token) = storefront.session.token().await {
        info!("signed in");
        println!("export STOREFRONT_AUTH_TOKEN={token}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        orders::OrderStatus,
        transport::{MockRemoteApi, Session},
    };
    use reqwest::Method;
    use serde_json::json;

    fn storefront(api: MockRemoteApi) -> Storefront {
        Storefront::with_api(Arc::new(api), Arc::new(Session::with_token(Some("t".into()))))
    }

    #[tokio::test]
    async fn delivered_orders_are_not_cancelled() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, _| *method == Method::GET && path == "/orders/o1")
            .times(1)
            .returning(|_, _, _| Ok(json!({ "id": "o1", "status": "Delivered", "items": [] })));

        let result = orders(
            &storefront(api),
            OrderCommand::Cancel {
                order_id: "o1".into(),
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(CliError::NotCancellable {
                status: OrderStatus::Delivered,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn placing_with_empty_cart_sends_no_order() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|_, path, _| path == "/cart")
            .times(1)
            .returning(|_, _, _| Ok(json!({ "cart": { "items": [] } })));

        let result = orders(&storefront(api), OrderCommand::Place { address: None }).await;

        assert!(matches!(result, Err(CliError::EmptyCart)));
    }

    #[tokio::test]
    async fn placing_falls_back_to_profile_address() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|_, path, _| path == "/cart")
            .returning(|_, _, _| {
                Ok(json!({ "cart": { "items": [{
                    "product": { "id": "p1", "name": "Kettle", "price": 100.0, "stock": 3 },
                    "quantity": 1
                }], "subtotal": 100.0, "tax": 18.0, "total": 118.0 } }))
            });
        api.expect_send()
            .withf(|_, path, _| path == "/auth/me")
            .returning(|_, _, _| {
                Ok(json!({ "user": { "id": "u1", "name": "Asha", "address": "12 MG Road" } }))
            });
        api.expect_send()
            .withf(|method, path, body| {
                *method == Method::POST
                    && path == "/orders"
                    && body == &Some(json!({ "address": "12 MG Road" }))
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(json!({ "order": { "id": "o5", "status": "Order Placed", "total": 118.0 } }))
            });

        let storefront = storefront(api);
        orders(&storefront, OrderCommand::Place { address: None })
            .await
            .unwrap();

        assert_eq!(storefront.orders.orders().await.len(), 1);
    }

    #[test]
    fn profile_without_fields_is_a_read() {
        assert!(is_empty_update(&ProfileUpdate::default()));
        assert!(!is_empty_update(&ProfileUpdate {
            name: Some("Asha".into()),
            ..ProfileUpdate::default()
        }));
    }
}
