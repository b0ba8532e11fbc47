//! Tool-augmented answering: tools, sessions, the engine loop and the
//! `RagSystem` that ties them together.

pub mod orchestrator;
pub mod outline_tool;
pub mod search_tool;
pub mod session;
pub mod system;
pub mod tools;
pub mod types;

pub use orchestrator::{Orchestrator, MAX_TOOL_ROUNDS};
pub use outline_tool::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use search_tool::{SearchCourseContentTool, SearchMiss, SEARCH_TOOL_NAME};
pub use session::{ConversationTurn, SessionManager};
pub use system::RagSystem;
pub use tools::{validate_args, Dispatcher, Tool, ToolRegistry};
pub use types::AnswerResult;
