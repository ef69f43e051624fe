use serde::Serialize;

/// Outcome of applying an operation to a single issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success,
    Failure { issue_key: String, message: String },
}

/// Aggregate outcome of a bulk run.
///
/// `successful + failed == total` once the run has finished, and
/// `failed_issues` holds one `"<key>: <message>"` entry per failure in
/// processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_issues: Vec<String>,
}

impl BulkSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: OperationResult) {
        match result {
            OperationResult::Success => self.successful += 1,
            OperationResult::Failure { issue_key, message } => {
                self.failed += 1;
                self.failed_issues.push(format!("{issue_key}: {message}"));
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
