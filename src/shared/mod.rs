pub mod candid;
pub mod canister;
pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
pub mod intent;
pub mod json_extract;
pub mod logging;
pub mod quest;
