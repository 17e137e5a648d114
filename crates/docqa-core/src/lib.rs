#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Core of the grounded question-answering pipeline: domain types, the error
//! taxonomy, layered configuration, collaborator traits, the chunker and the
//! stage-file helpers that move documents and chunks between pipeline steps.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use config::AppConfig;
pub use error::{Error, Result};
