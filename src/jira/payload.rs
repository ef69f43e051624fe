//! Request bodies for the Jira REST endpoints.

use serde_json::{json, Map, Value};

use crate::util::adf::paragraph_doc;

/// Parameters of a workflow transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionRequest {
    pub transition_id: String,
    pub resolution_id: Option<String>,
    pub comment: Option<String>,
    pub fields: Map<String, Value>,
}

impl TransitionRequest {
    pub fn new(transition_id: impl Into<String>) -> Self {
        Self {
            transition_id: transition_id.into(),
            ..Default::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_resolution(mut self, resolution_id: impl Into<String>) -> Self {
        self.resolution_id = Some(resolution_id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Body for `POST /issue/{key}/transitions`. A resolution is merged into
    /// `fields`; a comment is added through `update` as an ADF document.
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({ "transition": { "id": self.transition_id } });

        let mut fields = self.fields.clone();
        if let Some(resolution_id) = &self.resolution_id {
            fields.insert("resolution".into(), json!({ "id": resolution_id }));
        }
        if !fields.is_empty() {
            payload["fields"] = Value::Object(fields);
        }

        if let Some(comment) = &self.comment {
            payload["update"] = json!({
                "comment": [ { "add": { "body": paragraph_doc(comment) } } ]
            });
        }

        payload
    }
}

pub fn comment(text: &str) -> Value {
    json!({ "body": paragraph_doc(text) })
}

pub fn assign(account_id: &str) -> Value {
    json!({ "accountId": account_id })
}
