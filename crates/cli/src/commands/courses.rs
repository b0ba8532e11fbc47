//! Courses command handler.

use clap::Args;
use coursewise_core::{config::AppConfig, AppResult};
use coursewise_knowledge::RagSystem;

/// List loaded courses
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing courses command");

        let system = RagSystem::from_config(config).await?;
        let analytics = system.course_analytics().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&analytics)?);
            return Ok(());
        }

        println!("{} courses", analytics.total_courses);
        for title in &analytics.course_titles {
            println!("  - {}", title);
        }
        Ok(())
    }
}
