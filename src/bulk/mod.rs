use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{JiraError, Result};
use crate::model::issue::{BoardIssuesPage, Issue};
use crate::model::summary::{BulkSummary, OperationResult};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Paginated listing of the issues on a board.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one page. Any failure must surface as [`JiraError::Fetch`].
    async fn fetch_page(
        &self,
        board_id: &str,
        filter: Option<&str>,
        start_at: u32,
        max_results: u32,
    ) -> Result<BoardIssuesPage>;
}

/// Something applied to each issue of a bulk run, e.g. a workflow transition.
#[async_trait]
pub trait IssueOperation: Send + Sync {
    /// Apply to one issue. Failures are reported as [`JiraError::Operation`].
    async fn apply(&self, issue_key: &str) -> Result<()>;
}

/// Pages through a board's issues and applies an operation to every one.
pub struct BulkIssueOperator<'a> {
    source: &'a dyn IssueSource,
    page_size: u32,
}

impl<'a> BulkIssueOperator<'a> {
    pub fn new(source: &'a dyn IssueSource) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetch every matching issue, then apply `operation` to each in order.
    ///
    /// A failed page fetch aborts the run. Per-issue failures are collected in
    /// the returned summary and never stop the run.
    pub async fn run(
        &self,
        board_id: &str,
        filter: Option<&str>,
        operation: &dyn IssueOperation,
    ) -> Result<BulkSummary> {
        if board_id.trim().is_empty() {
            return Err(JiraError::Config("board id is required".into()));
        }
        if self.page_size == 0 {
            return Err(JiraError::Config("page size must be positive".into()));
        }

        let issues = self.collect_issues(board_id, filter).await?;
        info!(board_id, count = issues.len(), "applying operation to board issues");

        let mut summary = BulkSummary::new(issues.len());
        for issue in &issues {
            if !issue.has_key() {
                warn!(issue = %issue.label(), "skipping issue without a key");
                summary.record(OperationResult::Failure {
                    issue_key: issue.label(),
                    message: "issue has no key".into(),
                });
                continue;
            }
            let result = match operation.apply(&issue.key).await {
                Ok(()) => OperationResult::Success,
                Err(e) => {
                    warn!(issue = %issue.key, error = %e, "operation failed");
                    OperationResult::Failure {
                        issue_key: issue.key.clone(),
                        message: e.to_string(),
                    }
                }
            };
            summary.record(result);
        }

        info!(
            board_id,
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "bulk run finished"
        );
        Ok(summary)
    }

    async fn collect_issues(&self, board_id: &str, filter: Option<&str>) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut start_at = 0u32;
        // Latched from the first page; later pages may report a drifting total.
        let mut total: Option<u32> = None;

        loop {
            let page = self
                .source
                .fetch_page(board_id, filter, start_at, self.page_size)
                .await?;
            let returned = page.issues.len();
            let declared_total = *total.get_or_insert(page.total);
            debug!(
                board_id,
                start_at = page.start_at,
                max_results = page.max_results,
                returned,
                total = declared_total,
                "fetched page"
            );

            start_at += returned as u32;
            issues.extend(page.issues);

            if returned < self.page_size as usize || start_at >= declared_total {
                break;
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests;
