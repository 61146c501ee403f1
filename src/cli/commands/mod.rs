mod fetch;
mod keywords;

pub use fetch::{cmd_fetch, failure_message};
pub use keywords::cmd_keywords;
