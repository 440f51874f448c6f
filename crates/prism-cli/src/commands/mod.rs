pub mod dispatch;
pub mod document;
pub mod init;
pub mod issue;
pub mod query;
pub mod schema;
