//! Output module for notifications and reports
//!
//! This module handles:
//! - Rendering the match digest as HTML and markdown
//! - Delivering the digest through a [`Notifier`]
//! - Displaying history statistics

mod html;
mod markdown;
mod outbox;
pub mod stats;
mod traits;

pub use html::{escape_html, render_html, render_table};
pub use markdown::{format_markdown_digest, write_markdown_digest};
pub use outbox::{format_message, OutboxNotifier};
pub use stats::{format_statistics, load_statistics, print_statistics, HistoryReport};
pub use traits::{Digest, Notifier, OutputError, OutputResult};
