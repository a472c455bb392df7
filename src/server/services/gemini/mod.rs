pub mod service;
pub mod streaming;
pub mod types;

pub use service::GeminiService;
pub use types::{FunctionDeclaration, RawToolCall, RouterOutcome};
