use thiserror::Error;

use crate::server::surface::{MergeError, ValidationError};

/// Fixed reply used whenever the router collaborator is unreachable. No
/// failure is ever fatal to a request; this is the worst-case answer.
pub const ROUTER_APOLOGY: &str =
    "Sorry, I ran into a problem understanding that. Please try again.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("router unavailable: {0}")]
    Router(String),
    #[error("the {name} tool failed: {message}")]
    Tool { name: String, message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl AgentError {
    pub fn tool(name: impl Into<String>, message: impl ToString) -> Self {
        AgentError::Tool {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
