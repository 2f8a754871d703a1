//! GitLab directory provider
//!
//! Reads users from the GitLab REST API (v4):
//! - `GET /users` for the full listing, paginated via `X-Next-Page`
//! - `GET /users?external=true` for external collaborators
//! - `GET /users/:id/emails` for secondary addresses

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use dirsync_core::{DirectorySource, DirectoryUser, DirsyncError, RemoteUserState, Result};

use super::common::{collect_pages, Page, RetryPolicy, RetryingClient};

/// GitLab connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Instance URL, e.g. "https://gitlab.example.com"
    pub host_url: String,
    /// Personal or admin access token
    #[serde(skip_serializing)]
    pub token: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub page_size: u32,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host_url: "https://gitlab.com".to_string(),
            token: String::new(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            page_size: 100,
        }
    }
}

/// GitLab user as returned by `/users`
#[derive(Debug, Clone, Deserialize)]
struct GitLabUser {
    id: u64,
    username: String,
    #[serde(default)]
    name: String,
    /// Only visible to administrators
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    external: bool,
}

impl GitLabUser {
    fn primary_email(&self) -> String {
        self.email
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| self.public_email.clone())
            .unwrap_or_default()
    }
}

impl From<GitLabUser> for DirectoryUser {
    fn from(user: GitLabUser) -> Self {
        let email = user.primary_email();
        Self {
            id: user.id,
            username: user.username,
            display_name: user.name,
            email,
            state: RemoteUserState::from(user.state.as_str()),
            external: user.external,
        }
    }
}

/// Entry of `/users/:id/emails`
#[derive(Debug, Clone, Deserialize)]
struct GitLabEmail {
    #[allow(dead_code)]
    id: u64,
    email: String,
}

/// GitLab-backed directory source
pub struct GitLabDirectory {
    config: GitLabConfig,
    client: RetryingClient,
}

impl GitLabDirectory {
    pub fn new(config: GitLabConfig) -> Result<Self> {
        if config.host_url.trim().is_empty() {
            return Err(DirsyncError::configuration("GitLab host URL is empty"));
        }

        let client = RetryingClient::new(
            Duration::from_secs(config.timeout_secs),
            RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_delay_ms),
            },
        )?;

        Ok(Self { config, client })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/v4{}",
            self.config.host_url.trim_end_matches('/'),
            endpoint
        )
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<Page<T>> {
        let request = self
            .client
            .get(self.url(endpoint))
            .header("PRIVATE-TOKEN", &self.config.token)
            .header("Accept", "application/json")
            .query(query)
            .query(&[("per_page", self.config.page_size), ("page", page)]);

        let response = self.client.send(request).await?;

        // GitLab sends an empty X-Next-Page on the last page
        let next_page = response
            .headers()
            .get("x-next-page")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse().ok());

        let items = response.json().await.map_err(|e| {
            DirsyncError::directory(format!("Failed to parse GitLab response: {}", e))
        })?;

        Ok(Page { items, next_page })
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        collect_pages(|page| self.fetch_page(endpoint, query, page)).await
    }

    async fn find_user(&self, username: &str) -> Result<GitLabUser> {
        let users: Vec<GitLabUser> = self
            .fetch_all("/users", &[("username", username.to_string())])
            .await?;

        users
            .into_iter()
            .find(|u| u.username == username)
            .ok_or_else(|| DirsyncError::not_found("gitlab_user", username))
    }
}

#[async_trait]
impl DirectorySource for GitLabDirectory {
    #[instrument(skip(self), fields(host = %self.config.host_url))]
    async fn list_users(&self) -> Result<Vec<DirectoryUser>> {
        let users: Vec<GitLabUser> = self.fetch_all("/users", &[]).await?;
        info!("Fetched {} users from GitLab", users.len());
        Ok(users.into_iter().map(DirectoryUser::from).collect())
    }

    #[instrument(skip(self), fields(host = %self.config.host_url))]
    async fn list_external_users(&self) -> Result<Vec<DirectoryUser>> {
        let users: Vec<GitLabUser> = self
            .fetch_all("/users", &[("external", "true".to_string())])
            .await?;
        debug!("Fetched {} external users from GitLab", users.len());
        Ok(users.into_iter().map(DirectoryUser::from).collect())
    }

    #[instrument(skip(self), fields(host = %self.config.host_url))]
    async fn list_emails(&self, username: &str) -> Result<Vec<String>> {
        let user = self.find_user(username).await?;

        let mut emails: Vec<String> = self
            .fetch_all::<GitLabEmail>(&format!("/users/{}/emails", user.id), &[])
            .await?
            .into_iter()
            .map(|e| e.email)
            .collect();

        let primary = user.primary_email();
        if !primary.is_empty() && !emails.contains(&primary) {
            emails.push(primary);
        }

        debug!("Found {} emails for {}", emails.len(), username);
        Ok(emails)
    }
}
