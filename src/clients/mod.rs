pub mod ai_proxy;
pub mod gemini;
pub mod jikan;
