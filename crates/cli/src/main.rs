//! Cartwheel CLI - Drive the storefront cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog, optionally filtered
//! cartwheel products
//! cartwheel products --search shirt
//! cartwheel products --bestsellers 5
//!
//! # Work with the cart
//! cartwheel cart show
//! cartwheel cart add aaaab --size M
//! cartwheel cart update aaaab M 3
//!
//! # Sign in so cart changes are mirrored to the backend
//! cartwheel login <TOKEN>
//! cartwheel logout
//! ```
//!
//! Configuration comes from the environment (see
//! [`cartwheel_storefront::config`]). Every run loads the catalog and, when
//! a session token is stored, the user's cart before running the command.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartwheel_storefront::{ShopState, StorefrontConfig};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "cartwheel")]
#[command(author, version, about = "Cartwheel storefront cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products in the catalog
    Products {
        /// Only show products whose name contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only show this many bestsellers
        #[arg(short, long, conflicts_with = "search")]
        bestsellers: Option<usize>,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Store a session token and load the user's cart
    Login {
        /// Token issued by the backend at sign-in
        token: String,
    },
    /// Forget the session token and empty the cart
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print cart lines and totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: String,

        /// Size label (e.g., M)
        #[arg(short, long)]
        size: String,
    },
    /// Set the quantity of an item already in the cart
    Update {
        /// Product ID
        product_id: String,

        /// Size label
        size: String,

        /// New quantity (0 hides the item)
        quantity: u32,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Route warnings and errors to Sentry events, info and debug to breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartwheel_storefront=info,cartwheel_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let _sentry_guard = init_sentry(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let state = ShopState::from_config(config)?;
    let mut notices = state.subscribe_notices();

    state.bootstrap().await?;

    let outcome = dispatch(&state, cli.command).await;
    commands::print_notices(&mut notices);
    outcome
}

async fn dispatch(state: &ShopState, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Products {
            search,
            bestsellers,
        } => {
            commands::products::list(state, search.as_deref(), bestsellers);
            Ok(())
        }
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(state);
                Ok(())
            }
            CartAction::Add { product_id, size } => {
                commands::cart::add(state, &product_id, &size).await
            }
            CartAction::Update {
                product_id,
                size,
                quantity,
            } => commands::cart::update(state, &product_id, &size, quantity).await,
        },
        Commands::Login { token } => commands::session::login(state, &token).await,
        Commands::Logout => commands::session::logout(state),
    }
}
