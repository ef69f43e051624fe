use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

#[derive(Debug, Error)]
pub enum JiraError {
    /// Missing or invalid configuration, raised before any request is sent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A page of board issues could not be retrieved. Fatal to a bulk run.
    #[error("failed to fetch issues for board {board_id} at offset {start_at}: {message}")]
    Fetch {
        board_id: String,
        start_at: u32,
        message: String,
    },

    /// A single issue's operation failed. Recorded per item by bulk runs.
    #[error("{0}")]
    Operation(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{status}{}", message_suffix(.message))]
    Api { status: StatusCode, message: String },

    #[error("no user found matching '{0}'")]
    UserNotFound(String),
}

fn message_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}
