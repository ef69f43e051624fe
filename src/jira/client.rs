use std::collections::BTreeMap;

use base64::Engine;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use super::payload::{self, TransitionRequest};
use crate::config::JiraCredentials;
use crate::error::{JiraError, Result};
use crate::model::issue::{BoardIssuesPage, Comment, Transition, TransitionsResponse};
use crate::model::user::User;

pub struct JiraClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(creds: &JiraCredentials) -> Self {
        let basic = format!("{}:{}", creds.email, creds.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(basic);
        Self {
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    fn issue_url(&self, issue_key: &str, resource: &str) -> String {
        format!(
            "{}/rest/api/3/issue/{}/{resource}",
            self.base_url,
            urlencoding::encode(issue_key)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, url, "jira request");
        self.client
            .request(method, url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, error = %e, "failed to read error body");
                String::new()
            }
        };
        debug!(%status, body = %body, "jira request rejected");
        Err(JiraError::Api {
            status,
            message: api_error_message(&body),
        })
    }

    /// `GET /rest/agile/1.0/board/{boardId}/issue`
    pub async fn get_board_issues(
        &self,
        board_id: &str,
        jql: Option<&str>,
        start_at: u32,
        max_results: u32,
    ) -> Result<BoardIssuesPage> {
        let url = format!(
            "{}/rest/agile/1.0/board/{}/issue",
            self.base_url,
            urlencoding::encode(board_id)
        );
        let mut params = vec![
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        if let Some(jql) = jql {
            params.push(("jql", jql.to_string()));
        }

        let resp = self
            .send(self.request(Method::GET, &url).query(&params))
            .await?;
        Ok(resp.json().await?)
    }

    /// `GET /rest/api/3/issue/{key}/transitions`
    pub async fn get_available_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let url = self.issue_url(issue_key, "transitions");
        let resp = self.send(self.request(Method::GET, &url)).await?;
        let body: TransitionsResponse = resp.json().await?;
        Ok(body.transitions)
    }

    /// `POST /rest/api/3/issue/{key}/transitions`
    pub async fn perform_transition(
        &self,
        issue_key: &str,
        request: &TransitionRequest,
    ) -> Result<()> {
        let url = self.issue_url(issue_key, "transitions");
        self.send(self.request(Method::POST, &url).json(&request.to_payload()))
            .await?;
        Ok(())
    }

    /// `POST /rest/api/3/issue/{key}/comment`
    pub async fn add_comment(&self, issue_key: &str, text: &str) -> Result<Comment> {
        let url = self.issue_url(issue_key, "comment");
        let resp = self
            .send(self.request(Method::POST, &url).json(&payload::comment(text)))
            .await?;
        Ok(resp.json().await?)
    }

    /// Look up the account id of the first user matching `query` (usually an email).
    pub async fn find_account_id(&self, query: &str) -> Result<String> {
        let url = format!("{}/rest/api/3/user/search", self.base_url);
        let resp = self
            .send(self.request(Method::GET, &url).query(&[("query", query)]))
            .await?;
        let users: Vec<User> = resp.json().await?;
        users
            .into_iter()
            .next()
            .map(|u| u.account_id)
            .ok_or_else(|| JiraError::UserNotFound(query.to_string()))
    }

    /// `PUT /rest/api/3/issue/{key}/assignee`
    pub async fn assign_issue(&self, issue_key: &str, account_id: &str) -> Result<()> {
        let url = self.issue_url(issue_key, "assignee");
        self.send(self.request(Method::PUT, &url).json(&payload::assign(account_id)))
            .await?;
        Ok(())
    }

    /// `GET /rest/api/3/user/assignable/search`
    pub async fn assignable_users(&self, issue_key: &str) -> Result<Vec<User>> {
        let url = format!("{}/rest/api/3/user/assignable/search", self.base_url);
        let resp = self
            .send(self.request(Method::GET, &url).query(&[("issueKey", issue_key)]))
            .await?;
        Ok(resp.json().await?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
    /// Gateway-style bodies, e.g. `{"code":401,"message":"..."}`.
    message: Option<String>,
}

/// Flatten Jira's `{"errorMessages": [...], "errors": {...}}` into one line.
/// Bodies carrying none of the known fields are returned as-is.
pub(crate) fn api_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };

    let mut parts = parsed.error_messages;
    parts.extend(
        parsed
            .errors
            .into_iter()
            .map(|(field, message)| format!("{field}: {message}")),
    );
    parts.extend(parsed.message.filter(|m| !m.trim().is_empty()));

    if parts.is_empty() {
        body.trim().to_string()
    } else {
        parts.join("; ")
    }
}
