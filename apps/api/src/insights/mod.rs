pub mod handlers;
pub mod manager;
pub mod models;
pub mod prompts;
pub mod repository;
pub mod summarizer;
