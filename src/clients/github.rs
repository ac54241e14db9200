use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::clients::traits::{HostingApi, IssueComment, RepositoryMetadata};
use crate::context::RepoSlug;
use crate::error::{Result, ValidatorError};

const USER_AGENT: &str = concat!("hacs-validator/", env!("CARGO_PKG_VERSION"));
/// Topics are only returned with the mercy preview media type on older API versions
const ACCEPT: &str = "application/vnd.github.mercy-preview+json";
const PER_PAGE: usize = 100;

#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ValidatorError::Config {
                message: format!("Failed to build GitHub HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header(header::ACCEPT, ACCEPT);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let resp = self.authorize(req).send().await?;
        let resp = check_status(resp, what).await?;
        Ok(resp.json::<T>().await?)
    }
}

async fn check_status(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ValidatorError::Github {
        message: format!("{what} failed with {status}: {detail}"),
    })
}

#[async_trait]
impl HostingApi for GithubClient {
    async fn repository(&self, repo: &RepoSlug) -> Result<RepositoryMetadata> {
        debug!("Fetching repository metadata for {}", repo);
        let req = self
            .client
            .get(self.url(&format!("/repos/{}/{}", repo.owner, repo.name)));
        self.send_json(req, "GET repository").await
    }

    async fn list_comments(&self, repo: &RepoSlug, issue: u64) -> Result<Vec<IssueComment>> {
        let mut comments = Vec::new();
        let mut page = 1usize;
        loop {
            let req = self
                .client
                .get(self.url(&format!(
                    "/repos/{}/{}/issues/{}/comments",
                    repo.owner, repo.name, issue
                )))
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<IssueComment> = self.send_json(req, "List comments").await?;
            let done = batch.len() < PER_PAGE;
            comments.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        debug!("Found {} comments on #{}", comments.len(), issue);
        Ok(comments)
    }

    async fn create_comment(
        &self,
        repo: &RepoSlug,
        issue: u64,
        body: &str,
    ) -> Result<IssueComment> {
        let req = self
            .client
            .post(self.url(&format!(
                "/repos/{}/{}/issues/{}/comments",
                repo.owner, repo.name, issue
            )))
            .json(&CommentBody { body });
        self.send_json(req, "Create comment").await
    }

    async fn update_comment(
        &self,
        repo: &RepoSlug,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment> {
        let req = self
            .client
            .patch(self.url(&format!(
                "/repos/{}/{}/issues/comments/{}",
                repo.owner, repo.name, comment_id
            )))
            .json(&CommentBody { body });
        self.send_json(req, "Update comment").await
    }
}
