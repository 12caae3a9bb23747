// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod gemini_client;
pub mod http_response;
pub mod preference_file;
pub mod sheet_client;
