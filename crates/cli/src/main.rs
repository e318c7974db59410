//! Folio CLI - Drive the site backend from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in; the session is kept in FOLIO_SESSION_FILE
//! folio login -e ann@example.com -p secret1
//!
//! # Browse and fill the cart
//! folio products --search tea
//! folio cart add 3 --quantity 2
//!
//! # Place the order from the server-side cart
//! folio checkout --address "1 Main St" --phone 555-0100
//!
//! # Wallet
//! folio wallet add 50
//! folio wallet transfer 8 12.5 --description "Lunch"
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `register` / `send-code` / `whoami` - Account
//! - `products` / `categories` / `cart` / `checkout` / `orders` - Shop
//! - `wallet` - Balance, top-up, transfers, history
//! - `comments` / `guestbook` - Community

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_core::{CommentId, OrderId, ProductId, UserId};
use rust_decimal::Decimal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod config;

use commands::{CliError, Context};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Folio site client")]
struct Cli {
    /// Session file (overrides `FOLIO_SESSION_FILE`)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat of the password
        #[arg(long)]
        confirm: String,

        /// Code from `send-code`, verified right after registering
        #[arg(long)]
        code: Option<String>,
    },
    /// Email a verification code
    SendCode {
        #[arg(short, long)]
        email: String,
    },
    /// Show the logged-in user
    Whoami,
    /// List products
    Products {
        /// Case-insensitive match on name or description
        #[arg(short, long, default_value = "")]
        search: String,

        /// Exact category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List product categories
    Categories,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Order everything in the cart
    Checkout {
        #[arg(short, long)]
        address: String,

        #[arg(short, long)]
        phone: String,

        #[arg(short, long)]
        remark: Option<String>,
    },
    /// List or cancel orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Balance, top-up, and transfers
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Read and write comments
    Comments {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// Read and write the message board
    Guestbook {
        #[command(subcommand)]
        action: GuestbookAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        product: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line; below 1 removes it
    Set {
        product: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { product: ProductId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, newest as reported by the server
    List,
    /// Cancel a pending or paid order
    Cancel { order: OrderId },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Show the balance
    Show,
    /// Top up the balance
    Add {
        amount: Decimal,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Send money to another user
    Transfer {
        to: UserId,

        amount: Decimal,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show the transaction history
    History,
}

#[derive(Subcommand)]
enum CommentAction {
    /// List comments with their replies
    List {
        #[arg(long, default_value_t = folio_client::comments::DEFAULT_PAGE)]
        page: u32,
    },
    /// Post a top-level comment
    Post { content: String },
    /// Reply to a comment
    Reply { parent: CommentId, content: String },
    /// Change one of your comments
    Edit {
        id: CommentId,
        content: String,
        /// Page the comment is listed on
        #[arg(long, default_value_t = folio_client::comments::DEFAULT_PAGE)]
        page: u32,
    },
    /// Delete one of your comments
    Delete {
        id: CommentId,
        /// Page the comment is listed on
        #[arg(long, default_value_t = folio_client::comments::DEFAULT_PAGE)]
        page: u32,
    },
}

#[derive(Subcommand)]
enum GuestbookAction {
    /// List messages
    List,
    /// Leave a message
    Post {
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        email: String,

        content: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_cli=info,folio_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = CliConfig::from_env()?;
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    let mut ctx = Context::connect(&config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::account::logout(&ctx).await,
        Commands::Register {
            username,
            email,
            password,
            confirm,
            code,
        } => {
            commands::account::register(&ctx, username, email, password, confirm, code).await?;
        }
        Commands::SendCode { email } => commands::account::send_code(&ctx, &email).await?,
        Commands::Whoami => commands::account::whoami(&ctx).await,
        Commands::Products { search, category } => {
            commands::shop::products(&ctx, &search, category.as_deref()).await?;
        }
        Commands::Categories => commands::shop::categories(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::shop::show_cart(&ctx).await?,
            CartAction::Add { product, quantity } => {
                commands::shop::add_to_cart(&ctx, product, quantity).await?;
            }
            CartAction::Set { product, quantity } => {
                commands::shop::set_quantity(&ctx, product, quantity).await?;
            }
            CartAction::Remove { product } => {
                commands::shop::remove_from_cart(&ctx, product).await?;
            }
        },
        Commands::Checkout {
            address,
            phone,
            remark,
        } => {
            commands::shop::checkout(&ctx, &address, &phone, remark.as_deref()).await?;
        }
        Commands::Orders { action } => match action {
            OrderAction::List => commands::shop::list_orders(&ctx).await?,
            OrderAction::Cancel { order } => commands::shop::cancel_order(&ctx, order).await?,
        },
        Commands::Wallet { action } => match action {
            WalletAction::Show => commands::wallet::show(&ctx).await?,
            WalletAction::Add {
                amount,
                description,
            } => commands::wallet::add(&ctx, amount, description.as_deref()).await?,
            WalletAction::Transfer {
                to,
                amount,
                description,
            } => commands::wallet::transfer(&ctx, to, amount, description.as_deref()).await?,
            WalletAction::History => commands::wallet::history(&ctx).await?,
        },
        Commands::Comments { action } => match action {
            CommentAction::List { page } => commands::community::list_comments(&ctx, page).await?,
            CommentAction::Post { content } => {
                commands::community::post_comment(&ctx, &content, None).await?;
            }
            CommentAction::Reply { parent, content } => {
                commands::community::post_comment(&ctx, &content, Some(parent)).await?;
            }
            CommentAction::Edit { id, content, page } => {
                commands::community::edit_comment(&ctx, id, &content, page).await?;
            }
            CommentAction::Delete { id, page } => {
                commands::community::delete_comment(&ctx, id, page).await?;
            }
        },
        Commands::Guestbook { action } => match action {
            GuestbookAction::List => commands::community::list_messages(&mut ctx).await?,
            GuestbookAction::Post {
                name,
                email,
                content,
            } => commands::community::post_message(&mut ctx, &name, &email, &content).await?,
        },
    }
    Ok(())
}
