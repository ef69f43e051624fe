use async_trait::async_trait;

use super::payload::TransitionRequest;
use super::JiraClient;
use crate::bulk::{BulkIssueOperator, IssueOperation, IssueSource};
use crate::error::{JiraError, Result};
use crate::model::issue::BoardIssuesPage;
use crate::model::summary::BulkSummary;

#[async_trait]
impl IssueSource for JiraClient {
    async fn fetch_page(
        &self,
        board_id: &str,
        filter: Option<&str>,
        start_at: u32,
        max_results: u32,
    ) -> Result<BoardIssuesPage> {
        self.get_board_issues(board_id, filter, start_at, max_results)
            .await
            .map_err(|e| JiraError::Fetch {
                board_id: board_id.to_string(),
                start_at,
                message: e.to_string(),
            })
    }
}

/// Applies the same workflow transition to each issue it is given.
pub struct TransitionOperation<'a> {
    client: &'a JiraClient,
    request: TransitionRequest,
}

impl<'a> TransitionOperation<'a> {
    pub fn new(client: &'a JiraClient, request: TransitionRequest) -> Self {
        Self { client, request }
    }
}

#[async_trait]
impl IssueOperation for TransitionOperation<'_> {
    async fn apply(&self, issue_key: &str) -> Result<()> {
        self.client
            .perform_transition(issue_key, &self.request)
            .await
            .map_err(|e| JiraError::Operation(e.to_string()))
    }
}

impl JiraClient {
    /// Transition every issue on `board_id` matching `jql`.
    pub async fn transition_board_issues(
        &self,
        board_id: &str,
        request: TransitionRequest,
        jql: Option<&str>,
        page_size: u32,
    ) -> Result<BulkSummary> {
        let operation = TransitionOperation::new(self, request);
        BulkIssueOperator::new(self)
            .with_page_size(page_size)
            .run(board_id, jql, &operation)
            .await
    }
}
