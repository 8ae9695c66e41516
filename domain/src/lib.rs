pub mod buildkite;
pub mod error;
pub mod models;
pub mod reconcile;

pub use error::ParseError;
pub use models::*;
pub use reconcile::{job_environ_to_check_action, job_hook_to_check_action};
