pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod orchestrator;

use source_control::{GitHubApp, github::GitHub};

pub type App = GitHubApp<GitHub>;
