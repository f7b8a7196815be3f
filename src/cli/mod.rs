//! Command Line Interface
//!
//! `storefront` subcommands. Each invocation builds one [`Storefront`],
//! runs a single command against it and prints the result to stdout;
//! logs go to stderr.

pub mod commands;
pub mod render;

use std::process::ExitCode;

use clap::Subcommand;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    config::ClientConfig,
    error::StoreError,
    orders::OrderStatus,
    storefront::Storefront,
    transport::SessionEvent,
};

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and print the session token
    Login {
        #[arg(long)]
        mobile_number: String,

        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Use the admin login endpoint
        #[arg(long)]
        admin: bool,
    },

    /// Create a customer account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        mobile_number: String,

        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        date_of_birth: Option<String>,
    },

    /// Show the signed-in profile, or update it when fields are given
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        date_of_birth: Option<String>,
    },

    /// List products, optionally filtered
    Products {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,
    },

    /// Show one product
    Product { product_id: String },

    /// List product categories
    Categories,

    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        command: CartCommand,
    },

    /// Apply or remove a coupon
    Coupon {
        #[command(subcommand)]
        command: CouponCommand,
    },

    /// Place and track orders
    Orders {
        #[command(subcommand)]
        command: OrderCommand,
    },

    /// Admin console
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    Show,
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Update {
        product_id: String,
        quantity: u32,
    },
    Remove {
        product_id: String,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum CouponCommand {
    Apply { code: String },
    Remove,
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    List,
    Show {
        order_id: String,
    },
    /// Check out the current cart
    Place {
        /// Shipping address; defaults to the profile address
        #[arg(long)]
        address: Option<String>,
    },
    Cancel {
        order_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    Orders,
    SetStatus {
        order_id: String,
        /// One of: "Order Placed", Packed, Shipping, Delivered, Cancelled
        status: OrderStatus,
    },
    Coupons,
    CreateCoupon {
        code: String,
        #[arg(long)]
        discount_percentage: f64,
        #[arg(long, default_value_t = 0.0)]
        minimum_cart_value: f64,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        inactive: bool,
    },
    DeleteCoupon {
        coupon_id: String,
    },
    Products,
    Dashboard,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cart is empty")]
    EmptyCart,

    #[error("no shipping address given and none on the profile")]
    MissingAddress,

    #[error("order {order_id} is {status} and can no longer be cancelled")]
    NotCancellable {
        order_id: String,
        status: OrderStatus,
    },
}

impl CliError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Store(error) if error.is_session_expired())
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Exit status for a session that expired mid-command.
const EXIT_SESSION_EXPIRED: u8 = 2;

/// Runs one command and maps the outcome to an exit status.
pub async fn run(config: ClientConfig) -> ExitCode {
    let storefront = match Storefront::from_config(&config.api) {
        Ok(storefront) => storefront,
        Err(error) => {
            error!(%error, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let mut events = storefront.subscribe();

    let outcome = commands::execute(&storefront, config.command).await;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Expired { message } = event {
            warn!(%message, "session expired, sign in again with `storefront login`");
        }
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_session_expired() => ExitCode::from(EXIT_SESSION_EXPIRED),
        Err(CliError::Store(error)) => {
            debug!(?error, "command failed");
            eprintln!("error: {}", error.user_message("request failed"));
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
