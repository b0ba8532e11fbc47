//! Load command handler.

use clap::Args;
use coursewise_core::{config::AppConfig, AppResult};
use coursewise_knowledge::RagSystem;
use std::path::PathBuf;

/// Load course documents into the index
#[derive(Args, Debug)]
pub struct LoadCommand {
    /// Folder of course documents (default: rag.docsPath)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Clear the index and reload every course
    #[arg(long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl LoadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let folder = self.path.clone().unwrap_or_else(|| config.docs_dir());
        tracing::info!("Executing load command for {:?}", folder);

        let system = RagSystem::from_config(config).await?;
        let stats = system.clear_and_reload(&folder, self.force).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Loaded {} courses ({} chunks) in {:.2}s; {} already loaded, {} failed",
                stats.courses_added,
                stats.chunks_added,
                stats.duration_secs,
                stats.skipped,
                stats.failed
            );
        }

        Ok(())
    }
}
