use std::{fmt::Display, str::FromStr};

use url::Url;

use crate::error::ParseError;

/// A repository reference parsed from `owner/repo`, an https url or an
/// scp-like ssh locator such as `git@github.com:owner/repo.git`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub repo: String,
}

impl RepoName {
    pub fn parse(locator: &str) -> Result<Self, ParseError> {
        locator.parse()
    }
}

impl FromStr for RepoName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseError::RepoName(s.to_owned());
        let locator = s.trim();

        let path = if locator.contains("://") {
            let url = Url::parse(locator).map_err(|_| error())?;
            url.host_str().ok_or_else(error)?;
            url.path().to_owned()
        } else if let Some(path) = scp_path(locator) {
            path.to_owned()
        } else {
            locator.to_owned()
        };

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        match path.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoName {
                    owner: owner.to_owned(),
                    repo: repo.to_owned(),
                })
            }
            _ => Err(error()),
        }
    }
}

// `user@host:path`
fn scp_path(locator: &str) -> Option<&str> {
    let (user_host, path) = locator.split_once(':')?;
    let (user, host) = user_host.split_once('@')?;

    if user.is_empty() || host.is_empty() || user_host.contains('/') {
        None
    } else {
        Some(path)
    }
}

impl Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
