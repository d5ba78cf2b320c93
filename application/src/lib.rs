pub mod generator;
pub mod prompt;
pub mod rag_service;
pub mod registration;
