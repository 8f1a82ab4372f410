//! Ask command handler.
//!
//! Answers one question through the same composer the HTTP API uses.

use clap::Args;
use rag_core::{config::AppConfig, AppResult};
use rag_knowledge::{AnswerResponse, AnswerSource};

/// Answer one question and exit
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let composer = super::build_composer(config)?;
        let response = composer.answer(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!("{}", render_text(&response));
        }
        Ok(())
    }
}

fn render_text(response: &AnswerResponse) -> String {
    match (response.source, &response.matched_fact, response.distance) {
        (AnswerSource::KnowledgeBase, Some(fact), Some(distance)) => format!(
            "{}\n\n[source: {}, distance {:.3}]\n[fact: {}]",
            response.answer, response.source, distance, fact
        ),
        _ => format!("{}\n\n[source: {}]", response.answer, response.source),
    }
}
