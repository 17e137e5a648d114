//! Grounded answering: retrieve, render the context block, ask the generator.
//!
//! Retrieval errors go back to the caller. Generation failures of any kind
//! become the fixed fallback answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use docqa_core::config::GenerationConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Generator;
use docqa_core::types::{Answer, GenerationRequest, RetrievalHit};

use crate::retriever::Retriever;

const RULE: &str = "-----------------------------------";

/// Instruction sent as the system turn of every generation request.
pub fn system_instruction(language: &str) -> String {
    format!(
        "You are an assistant that answers questions using only the supplied [Official documents].\n\
\n\
[Rules]\n\
1. Look for the basis of your answer in the [Official documents] only.\n\
2. Answer clearly and politely, in {language} only.\n\
3. If the [Official documents] do not contain the answer, say that the provided documents do not contain the relevant information.\n\
4. Never guess or make up information that is not in the [Official documents].\n"
    )
}

/// Renders hits in rank order, numbered from 1.
pub fn render_context(hits: &[RetrievalHit]) -> String {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!("\n--- Document {} (source: {}) ---\n", i + 1, hit.chunk.source_id));
        context.push_str(&hit.chunk.text);
        context.push('\n');
        context.push_str(RULE);
        context.push('\n');
    }
    context
}

pub struct AnswerOrchestrator {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    config: GenerationConfig,
}

impl AnswerOrchestrator {
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>, config: GenerationConfig) -> Self {
        Self { retriever, generator, config }
    }

    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let hits = self.retriever.retrieve(query).await?;
        Ok(self.answer_from_hits(query, &hits).await)
    }

    pub async fn answer_from_hits(&self, query: &str, hits: &[RetrievalHit]) -> Answer {
        if hits.is_empty() {
            info!("no relevant documents found");
            return Answer::no_evidence();
        }
        let request = GenerationRequest {
            system_instruction: system_instruction(&self.config.language),
            context: render_context(hits),
            query: query.to_string(),
        };
        let timeout = self.config.timeout();
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.generator.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::GenerationTimeout(timeout)),
        };
        match outcome {
            Ok(text) => {
                info!(hits = hits.len(), elapsed_ms = started.elapsed().as_millis() as u64, "answer generated");
                Answer::grounded(text)
            }
            Err(e) => {
                let e = if e.is_generation_failure() { e } else { Error::GenerationProtocol(e.to_string()) };
                warn!(kind = e.kind(), error = %e, "generation failed");
                Answer::generation_failed()
            }
        }
    }
}
