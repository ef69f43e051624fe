pub mod issue;
pub mod summary;
pub mod user;
