//! Search command handler.

use super::print_sources;
use clap::Args;
use coursewise_core::{config::AppConfig, AppResult};
use coursewise_knowledge::RagSystem;

/// Search course content without the reasoning engine
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// What to search for
    pub query: String,

    /// Course name (partial names are resolved against the catalog)
    #[arg(long)]
    pub course: Option<String>,

    /// Lesson number
    #[arg(long)]
    pub lesson: Option<u32>,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search options: {:?}", self);

        let system = RagSystem::from_config(config).await?;
        let (text, sources) = system
            .search(&self.query, self.course.as_deref(), self.lesson)
            .await?;

        println!("{}", text);
        print_sources(&sources);
        Ok(())
    }
}
