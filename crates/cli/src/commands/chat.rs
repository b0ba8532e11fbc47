//! Chat command handler: a line-oriented conversation on stdin.

use super::print_answer;
use clap::Args;
use coursewise_core::{config::AppConfig, AppResult};
use coursewise_knowledge::RagSystem;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive conversation with history
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let system = RagSystem::from_config(config).await?;
        let mut session = system.create_session()?;

        eprintln!("Ask about your courses. '/clear' resets the conversation, 'exit' quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();

            match query {
                "" => continue,
                "exit" | "quit" => break,
                "/clear" => {
                    system.clear_session(&session)?;
                    session = system.create_session()?;
                    eprintln!("Conversation cleared.");
                    continue;
                }
                _ => {}
            }

            match system.answer(query, Some(&session)).await {
                Ok(result) => {
                    print_answer(&result);
                    println!();
                }
                Err(e) if e.is_collaborator_outage() => {
                    tracing::warn!("Query failed: {}", e);
                    eprintln!("Error: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        system.clear_session(&session)?;
        Ok(())
    }
}
