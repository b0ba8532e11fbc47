//! Command handlers for the Coursewise CLI.

pub mod ask;
pub mod chat;
pub mod courses;
pub mod load;
pub mod search;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use courses::CoursesCommand;
pub use load::LoadCommand;
pub use search::SearchCommand;

use coursewise_knowledge::{AnswerResult, SourceCitation};

/// Print citations under an answer, one per line.
pub(crate) fn print_sources(sources: &[SourceCitation]) {
    if sources.is_empty() {
        return;
    }

    println!("\nSources:");
    for source in sources {
        println!("  - {}", source);
    }
}

pub(crate) fn print_answer(result: &AnswerResult) {
    println!("{}", result.answer);
    print_sources(&result.sources);
}
