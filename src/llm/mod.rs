pub mod interface;
pub mod gemini;
pub mod types;

pub use interface::*;
pub use gemini::GeminiClient;
