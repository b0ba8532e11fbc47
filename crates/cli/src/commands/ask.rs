//! Ask command handler.

use super::print_answer;
use clap::Args;
use coursewise_core::{config::AppConfig, AppResult};
use coursewise_knowledge::RagSystem;

/// Ask one question about the loaded courses
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let system = RagSystem::from_config(config).await?;
        let result = system.answer(&self.query, None).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_answer(&result);
        }

        Ok(())
    }
}
