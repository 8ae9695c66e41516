use super::{check_run::RunDetails, repo_name::RepoName};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckAction {
    CreateRun { repo: RepoName, run: RunDetails },
    UpdateRun { repo: RepoName, run: RunDetails },
}

impl CheckAction {
    pub fn repo(&self) -> &RepoName {
        match self {
            CheckAction::CreateRun { repo, .. } | CheckAction::UpdateRun { repo, .. } => repo,
        }
    }

    pub fn run(&self) -> &RunDetails {
        match self {
            CheckAction::CreateRun { run, .. } | CheckAction::UpdateRun { run, .. } => run,
        }
    }

    pub fn run_mut(&mut self) -> &mut RunDetails {
        match self {
            CheckAction::CreateRun { run, .. } | CheckAction::UpdateRun { run, .. } => run,
        }
    }
}
