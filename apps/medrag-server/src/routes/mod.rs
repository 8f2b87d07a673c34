//! Route modules for MedRAG Server

pub mod documents;
pub mod health;
pub mod openai;
pub mod summaries;
