use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Jira issue as returned by the board and search endpoints.
///
/// Only the key is interpreted; everything else is carried through untouched.
/// A missing key decodes as empty so one malformed entry cannot sink a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub key: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    #[cfg(test)]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            extra: Map::new(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }

    /// Key for reporting; keyless issues fall back to their numeric id.
    pub fn label(&self) -> String {
        if self.has_key() {
            return self.key.clone();
        }
        match self.extra.get("id") {
            Some(Value::String(id)) => format!("<id {id}>"),
            Some(Value::Number(id)) => format!("<id {id}>"),
            _ => "<no key>".to_string(),
        }
    }
}

/// One page of the agile board-issue listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardIssuesPage {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: Option<TransitionTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionTarget {
    pub name: String,
}

#[derive(Deserialize)]
pub(crate) struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: Option<Value>,
    pub created: Option<String>,
}
