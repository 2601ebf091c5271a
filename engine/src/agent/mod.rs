//! Agent Loop Core
//!
//! Session state, the bounded conversation history and the turn
//! orchestrator that ties the response pipeline together.

pub mod core;
pub mod history;
pub mod session;

pub use self::core::{AgentCore, Flow, TurnSettings};
pub use history::HistoryStore;
pub use session::SessionContext;
