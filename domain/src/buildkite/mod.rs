pub mod environ;
pub mod hook;

pub use environ::{EnvironmentError, JobEnviron, VariableProblem};
pub use hook::{JobHook, JobState};
