pub mod assistants;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod http;
pub mod openai_client;
pub mod search;
