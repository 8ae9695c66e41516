pub mod action;
pub mod check_run;
pub mod repo_name;

pub use action::*;
pub use check_run::*;
pub use repo_name::*;
