//! CLI command handlers, one file per command plus shared helpers.

mod check;
mod credentials;
mod get;
mod output;
mod post;

pub use check::run_check;
pub use get::run_get;
pub use post::run_post;
