//! Code-hosting profile panel.
//!
//! Resolves the query against the GitHub API, trying organizations first
//! and falling back to users, and attaches the three most recently
//! updated repositories. An API token is optional but lifts the
//! unauthenticated rate limit.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const TOP_REPO_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CodePanel {
    pub name: String,
    pub login: String,
    pub description: String,
    pub url: String,
    pub avatar_url: Option<String>,
    pub public_repos: i64,
    pub followers: i64,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_username: Option<String>,
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    pub top_repos: Vec<RepoSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ProfileKind {
    Organization,
    User,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepoSummary {
    pub name: String,
    pub description: String,
    pub url: String,
    pub stars: i64,
    pub forks: i64,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    login: String,
    name: Option<String>,
    description: Option<String>,
    bio: Option<String>,
    html_url: String,
    avatar_url: Option<String>,
    #[serde(default)]
    public_repos: i64,
    #[serde(default)]
    followers: i64,
    blog: Option<String>,
    location: Option<String>,
    created_at: Option<String>,
    company: Option<String>,
    email: Option<String>,
    twitter_username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: i64,
    #[serde(default)]
    forks_count: i64,
    updated_at: Option<String>,
}

/// Client for the code-hosting profile lookup.
pub struct CodeClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl CodeClient {
    #[must_use]
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: token.into(),
        }
    }

    /// Override the API endpoint (for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up an organization or user profile matching the query.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures. Profile misses of any kind
    /// (including rate limiting) resolve to `Ok(None)`.
    pub async fn lookup(&self, query: &str) -> Result<Option<CodePanel>> {
        let handle = handle_from_query(query);
        if handle.is_empty() {
            return Ok(None);
        }

        if let Some(profile) = self.fetch_profile("orgs", &handle).await? {
            let repos = self.fetch_top_repos("orgs", &handle).await;
            return Ok(Some(assemble(profile, ProfileKind::Organization, repos)));
        }
        if let Some(profile) = self.fetch_profile("users", &handle).await? {
            let repos = self.fetch_top_repos("users", &handle).await;
            return Ok(Some(assemble(profile, ProfileKind::User, repos)));
        }
        Ok(None)
    }

    async fn fetch_profile(&self, scope: &str, handle: &str) -> Result<Option<ProfileResponse>> {
        let url = format!("{}/{scope}/{handle}", self.base_url);
        let response = self
            .request(&url)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let profile = response
            .json()
            .await
            .map_err(|e| AppError::Panel(format!("profile response: {e}")))?;
        Ok(Some(profile))
    }

    /// Most recently updated repositories; failures degrade to an empty
    /// list rather than suppressing the whole panel.
    async fn fetch_top_repos(&self, scope: &str, handle: &str) -> Vec<RepoSummary> {
        let url = format!(
            "{}/{scope}/{handle}/repos?sort=updated&per_page={TOP_REPO_COUNT}",
            self.base_url
        );
        let response = match self.request(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            _ => return Vec::new(),
        };
        let repos: Vec<RepoResponse> = match response.json().await {
            Ok(r) => r,
            Err(_) => return Vec::new(),
        };
        repos
            .into_iter()
            .take(TOP_REPO_COUNT)
            .map(|r| RepoSummary {
                name: r.name,
                description: r
                    .description
                    .unwrap_or_else(|| "No description available".to_owned()),
                url: r.html_url,
                stars: r.stargazers_count,
                forks: r.forks_count,
                updated_at: r.updated_at,
            })
            .collect()
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url);
        if !self.token.is_empty() {
            builder = builder.header("Authorization", format!("token {}", self.token));
        }
        builder
    }
}

fn assemble(profile: ProfileResponse, kind: ProfileKind, top_repos: Vec<RepoSummary>) -> CodePanel {
    let description = match kind {
        ProfileKind::Organization => profile
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description available".to_owned()),
        ProfileKind::User => profile
            .bio
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "No bio available".to_owned()),
    };
    let user_only = |v: Option<String>| match kind {
        ProfileKind::User => v,
        ProfileKind::Organization => None,
    };
    CodePanel {
        name: profile
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| profile.login.clone()),
        login: profile.login,
        description,
        url: profile.html_url,
        avatar_url: profile.avatar_url,
        public_repos: profile.public_repos,
        followers: profile.followers,
        blog: profile.blog.filter(|b| !b.is_empty()),
        location: profile.location,
        created_at: profile.created_at,
        company: user_only(profile.company),
        email: user_only(profile.email),
        twitter_username: user_only(profile.twitter_username),
        kind,
        top_repos,
    }
}

/// Lowercase the query and strip everything but word characters, so
/// "Saorsa Labs" resolves the handle `saorsalabs`.
fn handle_from_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .trim()
        .to_lowercase()
        .replace(char::is_whitespace, "")
}
