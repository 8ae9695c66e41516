use domain::{CheckRunId, RunDetails};
use http::HeaderMap;
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};
use serde::{Deserialize, Serialize};

use crate::{
    CheckRuns, TokenExchange,
    error::{GitHubError, Result},
    identity::{InstallationId, InstallationToken},
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PAGE_SIZE: u8 = 100;

/// Octocrab-backed transport; every client it builds carries exactly the
/// headers it was given and no credentials of its own.
#[derive(Clone, Debug)]
pub struct GitHub {
    base_uri: String,
}

impl Default for GitHub {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GitHub {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
        }
    }

    fn client(&self, headers: &HeaderMap) -> Result<Octocrab> {
        let mut builder = Octocrab::builder()
            .base_uri(self.base_uri.as_str())
            .map_err(|e| {
                GitHubError::Configuration(format!("invalid api url {}: {e}", self.base_uri))
            })?
            // One attempt per request.
            .add_retry_config(RetryConfig::None);

        for (name, value) in headers {
            let value = value
                .to_str()
                .map_err(|_| GitHubError::Generic(format!("header {name} is not valid text")))?;
            builder = builder.add_header(name.clone(), value.to_owned());
        }

        Ok(builder.build()?)
    }

    /// `GET /app`, authenticated with app headers.
    pub async fn current_app(&self, app_headers: &HeaderMap) -> Result<serde_json::Value> {
        self.client(app_headers)?
            .get("/app", None::<&()>)
            .await
            .map_err(authentication)
    }

    pub fn checks(&self, installation_headers: &HeaderMap) -> Result<GitHubChecks> {
        Ok(GitHubChecks {
            octocrab: self.client(installation_headers)?,
        })
    }
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

#[derive(Deserialize)]
struct Installation {
    id: InstallationId,
    account: Option<Account>,
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

impl TokenExchange for GitHub {
    async fn find_installation(
        &self,
        app_headers: &HeaderMap,
        account: &str,
    ) -> Result<InstallationId> {
        let client = self.client(app_headers)?;

        for page in 1.. {
            let installations: Vec<Installation> = client
                .get(
                    "/app/installations",
                    Some(&PageParams {
                        per_page: PAGE_SIZE,
                        page,
                    }),
                )
                .await
                .map_err(authentication)?;

            let found = installations.iter().find(|installation| {
                installation
                    .account
                    .as_ref()
                    .is_some_and(|owner| owner.login.eq_ignore_ascii_case(account))
            });

            if let Some(installation) = found {
                tracing::debug!("Resolved {account} to installation {}", installation.id);
                return Ok(installation.id);
            }

            if installations.len() < PAGE_SIZE as usize {
                break;
            }
        }

        Err(GitHubError::Authentication {
            status: 404,
            message: format!("app is not installed for account {account}"),
        })
    }

    async fn create_access_token(
        &self,
        app_headers: &HeaderMap,
        installation: InstallationId,
    ) -> Result<InstallationToken> {
        self.client(app_headers)?
            .post(
                format!("/app/installations/{installation}/access_tokens"),
                None::<&()>,
            )
            .await
            .map_err(authentication)
    }
}

pub struct GitHubChecks {
    octocrab: Octocrab,
}

#[derive(Deserialize)]
struct CheckRunList {
    total_count: usize,
    check_runs: Vec<RunDetails>,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

impl GitHubChecks {
    pub async fn resolve_branch_sha(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let reference: GitRef = self
            .octocrab
            .get(
                format!("/repos/{owner}/{repo}/git/ref/heads/{branch}"),
                None::<&()>,
            )
            .await
            .map_err(remote)?;

        Ok(reference.object.sha)
    }
}

impl CheckRuns for GitHubChecks {
    async fn list_runs(&self, owner: &str, repo: &str, r#ref: &str) -> Result<Vec<RunDetails>> {
        let route = format!("/repos/{owner}/{repo}/commits/{}/check-runs", r#ref);
        let mut runs = Vec::new();

        for page in 1.. {
            let response: CheckRunList = self
                .octocrab
                .get(
                    &route,
                    Some(&PageParams {
                        per_page: PAGE_SIZE,
                        page,
                    }),
                )
                .await
                .map_err(remote)?;

            let received = response.check_runs.len();
            runs.extend(response.check_runs);

            if received == 0 || runs.len() >= response.total_count {
                break;
            }
        }

        tracing::debug!("Found {} check runs on {owner}/{repo}@{}", runs.len(), r#ref);

        Ok(runs)
    }

    async fn create_run(&self, owner: &str, repo: &str, run: &RunDetails) -> Result<RunDetails> {
        self.octocrab
            .post(format!("/repos/{owner}/{repo}/check-runs"), Some(run))
            .await
            .map_err(remote)
    }

    async fn update_run(
        &self,
        owner: &str,
        repo: &str,
        id: CheckRunId,
        run: &RunDetails,
    ) -> Result<RunDetails> {
        self.octocrab
            .patch(format!("/repos/{owner}/{repo}/check-runs/{id}"), Some(run))
            .await
            .map_err(remote)
    }
}

fn authentication(error: octocrab::Error) -> GitHubError {
    match error {
        octocrab::Error::GitHub { source, .. } => GitHubError::Authentication {
            status: source.status_code.as_u16(),
            message: source.message,
        },
        error => GitHubError::Octocrab(error),
    }
}

fn remote(error: octocrab::Error) -> GitHubError {
    match error {
        octocrab::Error::GitHub { source, .. } => GitHubError::Remote {
            status: source.status_code.as_u16(),
            message: source.message,
        },
        error => GitHubError::Octocrab(error),
    }
}
