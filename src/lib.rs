//! Chat translator: a small HTTP service that translates free text through a
//! generative-language API and keeps each user's translations as chat history.

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod history;
pub mod language;
pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod security;
pub mod server;
