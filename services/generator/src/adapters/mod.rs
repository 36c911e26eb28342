pub mod credentials;
pub mod gemini;
pub mod result_store;
pub mod text_file;

pub use credentials::MemoryCredentialStore;
pub use gemini::{GeminiAdapter, GeminiSettings};
pub use result_store::JsonFileResultStore;
pub use text_file::PlainTextExtractor;
