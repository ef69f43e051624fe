use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BulkIssueOperator, IssueOperation, IssueSource};
use crate::error::{JiraError, Result};
use crate::model::issue::{BoardIssuesPage, Issue};
use crate::model::summary::BulkSummary;

enum ScriptedPage {
    Issues { count: usize, total: u32 },
    Keys { keys: Vec<&'static str>, total: u32 },
    Fail,
}

/// A source that replays scripted pages and records every requested offset.
struct ScriptedSource {
    pages: Vec<ScriptedPage>,
    calls: Arc<Mutex<Vec<(u32, u32, Option<String>)>>>,
}

impl ScriptedSource {
    fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn full_pages(total: u32, page_size: u32) -> Self {
        let mut pages = Vec::new();
        let mut remaining = total;
        while remaining > 0 {
            let count = remaining.min(page_size);
            pages.push(ScriptedPage::Issues {
                count: count as usize,
                total,
            });
            remaining -= count;
        }
        Self::new(pages)
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn offsets(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }
}

#[async_trait]
impl IssueSource for ScriptedSource {
    async fn fetch_page(
        &self,
        board_id: &str,
        filter: Option<&str>,
        start_at: u32,
        max_results: u32,
    ) -> Result<BoardIssuesPage> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((start_at, max_results, filter.map(String::from)));
            calls.len() - 1
        };

        match self.pages.get(index) {
            Some(ScriptedPage::Issues { count, total }) => Ok(BoardIssuesPage {
                start_at,
                max_results,
                total: *total,
                issues: (0..*count)
                    .map(|i| Issue::new(format!("SP-{}", start_at as usize + i + 1)))
                    .collect(),
            }),
            Some(ScriptedPage::Keys { keys, total }) => Ok(BoardIssuesPage {
                start_at,
                max_results,
                total: *total,
                issues: keys.iter().map(|k| Issue::new(*k)).collect(),
            }),
            Some(ScriptedPage::Fail) => Err(JiraError::Fetch {
                board_id: board_id.to_string(),
                start_at,
                message: "connection reset by peer".into(),
            }),
            None => Ok(BoardIssuesPage::default()),
        }
    }
}

/// An operation that records applied keys and fails for configured ones.
#[derive(Default)]
struct RecordingOperation {
    applied: Arc<Mutex<Vec<String>>>,
    failures: HashMap<String, String>,
}

impl RecordingOperation {
    fn failing(mut self, key: &str, message: &str) -> Self {
        self.failures.insert(key.to_string(), message.to_string());
        self
    }

    fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueOperation for RecordingOperation {
    async fn apply(&self, issue_key: &str) -> Result<()> {
        self.applied.lock().unwrap().push(issue_key.to_string());
        match self.failures.get(issue_key) {
            Some(message) => Err(JiraError::Operation(message.clone())),
            None => Ok(()),
        }
    }
}

fn assert_consistent(summary: &BulkSummary) {
    assert_eq!(summary.successful + summary.failed, summary.total);
    assert_eq!(summary.failed_issues.len(), summary.failed);
}

#[tokio::test]
async fn pages_through_250_issues_in_three_fetches() {
    let source = ScriptedSource::full_pages(250, 100);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0, 100, 200]);
    assert_eq!(summary.total, 250);
    assert_eq!(summary.successful, 250);
    assert_consistent(&summary);
}

#[tokio::test]
async fn exact_multiple_of_page_size_stops_on_total() {
    let source = ScriptedSource::full_pages(200, 100);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .run("SP", None, &op)
        .await
        .unwrap();

    // ceil(200 / 100) fetches, no trailing empty page
    assert_eq!(source.call_count(), 2);
    assert_eq!(summary.total, 200);
}

#[tokio::test]
async fn empty_first_page_yields_empty_summary() {
    let source = ScriptedSource::new(vec![ScriptedPage::Issues { count: 0, total: 0 }]);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .run("SP", Some("status = 'To Do'"), &op)
        .await
        .unwrap();

    assert_eq!(source.call_count(), 1);
    assert_eq!(summary, BulkSummary::default());
    assert!(op.applied().is_empty());
}

#[tokio::test]
async fn short_page_ends_pagination_before_declared_total() {
    let source = ScriptedSource::new(vec![
        ScriptedPage::Issues { count: 10, total: 500 },
        ScriptedPage::Issues { count: 4, total: 500 },
        ScriptedPage::Issues { count: 10, total: 500 },
    ]);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .with_page_size(10)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0, 10]);
    assert_eq!(summary.total, 14);
    assert_consistent(&summary);
}

#[tokio::test]
async fn total_is_latched_from_first_page() {
    // Later pages claim a larger total; only the first one counts.
    let source = ScriptedSource::new(vec![
        ScriptedPage::Issues { count: 5, total: 10 },
        ScriptedPage::Issues { count: 5, total: 30 },
        ScriptedPage::Issues { count: 5, total: 30 },
    ]);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .with_page_size(5)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(source.call_count(), 2);
    assert_eq!(summary.total, 10);
}

#[tokio::test]
async fn records_failures_and_keeps_going() {
    let source = ScriptedSource::new(vec![ScriptedPage::Keys {
        keys: vec!["SP-3", "SP-4", "SP-7", "SP-8", "SP-9"],
        total: 5,
    }]);
    let op = RecordingOperation::default().failing("SP-7", "403 Forbidden");

    let summary = BulkIssueOperator::new(&source)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(
        summary,
        BulkSummary {
            total: 5,
            successful: 4,
            failed: 1,
            failed_issues: vec!["SP-7: 403 Forbidden".into()],
        }
    );
    assert_eq!(op.applied(), vec!["SP-3", "SP-4", "SP-7", "SP-8", "SP-9"]);
}

#[tokio::test]
async fn keyless_issue_is_a_failure_not_an_abort() {
    let source = ScriptedSource::new(vec![ScriptedPage::Keys {
        keys: vec!["SP-1", "", "SP-3"],
        total: 3,
    }]);
    let op = RecordingOperation::default();

    let summary = BulkIssueOperator::new(&source)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed_issues, vec!["<no key>: issue has no key"]);
    assert_eq!(op.applied(), vec!["SP-1", "SP-3"]);
    assert_consistent(&summary);
}

#[tokio::test]
async fn failure_messages_keep_processing_order() {
    let source = ScriptedSource::full_pages(6, 2);
    let op = RecordingOperation::default()
        .failing("SP-5", "404 Not Found")
        .failing("SP-2", "400 Bad Request: Transition is not valid");

    let summary = BulkIssueOperator::new(&source)
        .with_page_size(2)
        .run("SP", None, &op)
        .await
        .unwrap();

    assert_eq!(
        summary.failed_issues,
        vec![
            "SP-2: 400 Bad Request: Transition is not valid",
            "SP-5: 404 Not Found"
        ]
    );
    assert_eq!(summary.successful, 4);
    assert_consistent(&summary);
}

#[tokio::test]
async fn fetch_error_on_second_page_aborts_run() {
    let source = ScriptedSource::new(vec![
        ScriptedPage::Issues { count: 100, total: 250 },
        ScriptedPage::Fail,
    ]);
    let op = RecordingOperation::default();

    let err = BulkIssueOperator::new(&source)
        .run("SP", None, &op)
        .await
        .unwrap_err();

    assert!(matches!(err, JiraError::Fetch { start_at: 100, .. }));
    // Nothing is applied when the listing is incomplete.
    assert!(op.applied().is_empty());
}

#[tokio::test]
async fn filter_and_page_size_are_passed_through() {
    let source = ScriptedSource::new(vec![ScriptedPage::Issues { count: 1, total: 1 }]);
    let op = RecordingOperation::default();

    BulkIssueOperator::new(&source)
        .with_page_size(25)
        .run("SP", Some("project = SP AND status = 'To Do'"), &op)
        .await
        .unwrap();

    let calls = source.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        (0, 25, Some("project = SP AND status = 'To Do'".to_string()))
    );
}

#[tokio::test]
async fn zero_page_size_is_rejected_before_fetching() {
    let source = ScriptedSource::full_pages(3, 3);
    let op = RecordingOperation::default();

    let err = BulkIssueOperator::new(&source)
        .with_page_size(0)
        .run("SP", None, &op)
        .await
        .unwrap_err();

    assert!(matches!(err, JiraError::Config(_)));
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn blank_board_id_is_rejected_before_fetching() {
    let source = ScriptedSource::full_pages(3, 3);
    let op = RecordingOperation::default();

    let err = BulkIssueOperator::new(&source)
        .run("  ", None, &op)
        .await
        .unwrap_err();

    assert!(matches!(err, JiraError::Config(_)));
    assert_eq!(source.call_count(), 0);
}
