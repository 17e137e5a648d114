//! Retrieval-augmented answering: index build, k-NN retrieval and grounded
//! answer generation over the collaborators defined in `docqa-core`.

pub mod indexer;
pub mod ollama;
pub mod orchestrator;
pub mod retriever;

pub use indexer::Indexer;
pub use ollama::OllamaGenerator;
pub use orchestrator::{render_context, system_instruction, AnswerOrchestrator};
pub use retriever::Retriever;
