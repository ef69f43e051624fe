use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;

use crate::bulk::DEFAULT_PAGE_SIZE;
use crate::config::{self, AppConfig};
use crate::jira::payload::TransitionRequest;
use crate::jira::JiraClient;
use crate::model::issue::Transition;
use crate::model::summary::BulkSummary;
use crate::model::user::User;
use crate::util::adf::extract_text_from_adf;

/// Small toolbox for the Jira Cloud REST API.
#[derive(Debug, Parser)]
#[command(name = "jira-ops", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.jira-ops/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a comment to an issue
    Comment { issue: String, text: String },

    /// Assign an issue to the user with the given email
    Assign { issue: String, email: String },

    /// List users that can be assigned to an issue
    Assignable { issue: String },

    /// List the workflow transitions available for an issue
    Transitions { issue: String },

    /// Perform a workflow transition on one issue
    Transition {
        issue: String,
        transition_id: String,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        resolution: Option<String>,
        /// Extra field to set, as NAME=VALUE. VALUE is parsed as JSON when possible.
        #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Apply a transition to every issue on a board matching a JQL filter
    BulkTransition {
        board: String,
        transition_id: String,
        #[arg(long)]
        jql: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.trim().is_empty() {
        return Err("field name cannot be empty".into());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    let creds = config.jira.resolve()?;
    let client = JiraClient::new(&creds);

    match cli.command {
        Command::Comment { issue, text } => {
            if text.trim().is_empty() {
                bail!("Comment text cannot be empty");
            }
            let comment = client
                .add_comment(&issue, &text)
                .await
                .with_context(|| format!("Failed to comment on {issue}"))?;
            let body = comment
                .body
                .as_ref()
                .and_then(extract_text_from_adf)
                .unwrap_or_default();
            match comment.created {
                Some(created) => println!("Added comment {} to {issue} at {created}: {body}", comment.id),
                None => println!("Added comment {} to {issue}: {body}", comment.id),
            }
        }
        Command::Assign { issue, email } => {
            let account_id = client
                .find_account_id(&email)
                .await
                .with_context(|| format!("Failed to look up {email}"))?;
            client
                .assign_issue(&issue, &account_id)
                .await
                .with_context(|| format!("Failed to assign {issue}"))?;
            println!("Assigned {issue} to {email} ({account_id})");
        }
        Command::Assignable { issue } => {
            let users = client
                .assignable_users(&issue)
                .await
                .with_context(|| format!("Failed to list assignable users for {issue}"))?;
            for line in format_users(&users) {
                println!("{line}");
            }
        }
        Command::Transitions { issue } => {
            let transitions = client
                .get_available_transitions(&issue)
                .await
                .with_context(|| format!("Failed to list transitions for {issue}"))?;
            println!("Available transitions for {issue}:");
            for line in format_transitions(&transitions) {
                println!("{line}");
            }
        }
        Command::Transition {
            issue,
            transition_id,
            comment,
            resolution,
            fields,
        } => {
            let request = build_transition(transition_id, comment, resolution, fields);
            client
                .perform_transition(&issue, &request)
                .await
                .with_context(|| format!("Failed to transition {issue}"))?;
            println!("Transitioned {issue} ({})", request.transition_id);
        }
        Command::BulkTransition {
            board,
            transition_id,
            jql,
            page_size,
            json,
        } => {
            let page_size = effective_page_size(page_size, &config);
            let summary = client
                .transition_board_issues(
                    &board,
                    TransitionRequest::new(transition_id),
                    jql.as_deref(),
                    page_size,
                )
                .await
                .with_context(|| format!("Bulk transition on board {board} failed"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", format_summary(&summary));
            }
        }
    }

    Ok(())
}

fn build_transition(
    transition_id: String,
    comment: Option<String>,
    resolution: Option<String>,
    fields: Vec<(String, Value)>,
) -> TransitionRequest {
    let mut request = TransitionRequest::new(transition_id);
    if let Some(comment) = comment {
        request = request.with_comment(comment);
    }
    if let Some(resolution) = resolution {
        request = request.with_resolution(resolution);
    }
    for (name, value) in fields {
        request = request.with_field(name, value);
    }
    request
}

fn effective_page_size(flag: Option<u32>, config: &AppConfig) -> u32 {
    flag.or_else(|| config.bulk.as_ref().and_then(|b| b.page_size))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

fn format_transitions(transitions: &[Transition]) -> Vec<String> {
    transitions
        .iter()
        .map(|t| match &t.to {
            Some(to) if to.name != t.name => format!("  - {} (ID: {}) -> {}", t.name, t.id, to.name),
            _ => format!("  - {} (ID: {})", t.name, t.id),
        })
        .collect()
}

fn format_users(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|u| {
            let name = u.display_name.as_deref().unwrap_or("(no name)");
            let line = match &u.email_address {
                Some(email) => format!("{name} <{email}> {}", u.account_id),
                None => format!("{name} {}", u.account_id),
            };
            if u.active {
                line
            } else {
                format!("{line} (inactive)")
            }
        })
        .collect()
}

fn format_summary(summary: &BulkSummary) -> String {
    let mut out = format!(
        "Processed {} issues: {} transitioned, {} failed\n",
        summary.total, summary.successful, summary.failed
    );
    if summary.has_failures() {
        out.push_str("Failures:\n");
        for failure in &summary.failed_issues {
            out.push_str(&format!("  {failure}\n"));
        }
    }
    out
}
