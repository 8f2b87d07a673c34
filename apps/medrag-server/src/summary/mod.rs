//! Summary Module
//!
//! Structured analysis of extracted document text by a remote language model.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medrag_server::summary::{OpenAiClient, Summarizer};
//!
//! let summarizer = Summarizer::new(Arc::new(OpenAiClient::new(&config.llm)), None);
//! let analysis = summarizer.analyze(Some(&text), None, Some(&api_key)).await?;
//! ```

mod client;
mod prompt;
mod summarizer;
mod types;

use thiserror::Error;

pub use client::{LlmClient, OpenAiClient};
pub use summarizer::Summarizer;
pub use types::{MedicalDocumentAnalysis, MedicalEvent, Medication, PatientDetails, Procedure};

#[cfg(test)]
pub(crate) use client::ScriptedClient;

/// Summarization errors
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("No context available for analysis")]
    NoContext,

    #[error("An OpenAI API key is required")]
    MissingApiKey,

    #[error("{0}")]
    Upstream(String),

    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Request to the language model timed out")]
    Timeout,
}
