mod client;
mod operations;
pub mod payload;

pub use client::JiraClient;
