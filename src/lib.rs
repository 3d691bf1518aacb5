//! Shared pieces of the HQ4L agents: Candid and JSON readers, the chat
//! protocol, capability clients, configuration and logging.
pub mod shared;
