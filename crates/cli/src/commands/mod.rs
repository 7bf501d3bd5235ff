//! Subcommand implementations.
//!
//! Each command works on an already bootstrapped [`ShopState`] and writes
//! its output to stdout. Diagnostics go through `tracing` to stderr.

pub mod cart;
pub mod products;
pub mod session;

use cartwheel_storefront::{BackendError, Notice, NoticeLevel, ShopError};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that end a CLI run with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend client could not be built.
    #[error("Backend setup failed: {0}")]
    Backend(#[from] BackendError),

    /// A state operation failed.
    #[error("{}", .0.user_message())]
    Shop(#[from] ShopError),

    /// Argument failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },

    /// Background sync task panicked or was cancelled.
    #[error("Cart sync task failed: {0}")]
    Sync(#[from] tokio::task::JoinError),
}

/// Print every notice received so far.
pub fn print_notices(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        #[allow(clippy::print_stdout)]
        {
            println!("{}", format_notice(&notice));
        }
    }
}

fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}
