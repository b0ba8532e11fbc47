//! Bounded conversation history per session.

use coursewise_core::{AppError, AppResult};
use coursewise_llm::Role;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

/// Session store keeping the most recent `max_history` exchanges per session.
///
/// Each operation is atomic. Ordering of concurrent requests against the
/// same session is up to the caller.
pub struct SessionManager {
    max_history: usize,
    sessions: RwLock<HashMap<String, VecDeque<ConversationTurn>>>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, HashMap<String, VecDeque<ConversationTurn>>>> {
        self.sessions
            .read()
            .map_err(|_| AppError::Other("Session store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<String, VecDeque<ConversationTurn>>>> {
        self.sessions
            .write()
            .map_err(|_| AppError::Other("Session store lock poisoned".to_string()))
    }

    /// Start an empty session and return its id.
    pub fn create_session(&self) -> AppResult<String> {
        let id = format!("session_{}", uuid::Uuid::new_v4().simple());
        self.write()?.insert(id.clone(), VecDeque::new());
        tracing::debug!("Created session {}", id);
        Ok(id)
    }

    /// Record one exchange, creating the session on first contact and
    /// evicting the oldest exchange past the limit.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> AppResult<()> {
        let mut sessions = self.write()?;
        let turns = sessions.entry(session_id.to_string()).or_default();

        turns.push_back(ConversationTurn {
            role: Role::User,
            text: user.to_string(),
        });
        turns.push_back(ConversationTurn {
            role: Role::Assistant,
            text: assistant.to_string(),
        });

        while turns.len() > self.max_history * 2 {
            turns.pop_front();
        }
        Ok(())
    }

    /// History rendered as `User: ...` / `Assistant: ...` lines, or `None`
    /// for unknown or empty sessions.
    pub fn get_history(&self, session_id: &str) -> AppResult<Option<String>> {
        let sessions = self.read()?;
        let Some(turns) = sessions.get(session_id).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let lines: Vec<String> = turns
            .iter()
            .map(|turn| match turn.role {
                Role::User => format!("User: {}", turn.text),
                Role::Assistant => format!("Assistant: {}", turn.text),
            })
            .collect();
        Ok(Some(lines.join("\n")))
    }

    pub fn turns(&self, session_id: &str) -> AppResult<Vec<ConversationTurn>> {
        Ok(self
            .read()?
            .get(session_id)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Forget a session. Unknown ids are ignored.
    pub fn clear_session(&self, session_id: &str) -> AppResult<()> {
        self.write()?.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_format() {
        let sessions = SessionManager::new(2);
        let id = sessions.create_session().unwrap();
        assert_eq!(sessions.get_history(&id).unwrap(), None);

        sessions.add_exchange(&id, "What is a widget?", "A small part.").unwrap();
        assert_eq!(
            sessions.get_history(&id).unwrap().as_deref(),
            Some("User: What is a widget?\nAssistant: A small part.")
        );
    }

    #[test]
    fn test_oldest_exchange_evicted() {
        let sessions = SessionManager::new(2);
        for i in 1..=3 {
            sessions
                .add_exchange("s", &format!("q{}", i), &format!("a{}", i))
                .unwrap();
        }

        let turns = sessions.turns("s").unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].text, "q2");
        assert_eq!(turns[3].text, "a3");
    }

    #[test]
    fn test_unique_ids_and_clear() {
        let sessions = SessionManager::new(2);
        let a = sessions.create_session().unwrap();
        let b = sessions.create_session().unwrap();
        assert_ne!(a, b);

        sessions.add_exchange(&a, "q", "a").unwrap();
        sessions.clear_session(&a).unwrap();
        assert_eq!(sessions.get_history(&a).unwrap(), None);
        sessions.clear_session("never-existed").unwrap();
    }
}
