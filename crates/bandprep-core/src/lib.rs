//! # bandprep Core Library
//!
//! Core logic for a timed writing-exam practice tool. All operations are
//! available through the `bandprep` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session Timer**: A wall-clock-based countdown that persists the active
//!   task and reconciles elapsed time on resume; the caller drives `tick()`
//! - **Storage**: SQLite key-value store and TOML-based configuration
//! - **Integrations**: Remote text-completion client (Gemini)
//! - **Evaluation**: Prompt building and best-effort parsing of the scored reply
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: Core countdown state machine
//! - [`PracticeService`]: Generate/start, submit and record flow
//! - [`Database`]: Persistent key-value storage
//! - [`Config`]: Application configuration management
//! - [`CompletionClient`]: Trait for the remote completion service

pub mod error;
pub mod evaluator;
pub mod generator;
pub mod history;
pub mod integrations;
pub mod practice;
pub mod prompts;
pub mod render;
pub mod secret;
pub mod storage;
pub mod task;
pub mod timer;
pub mod wordcount;

pub use error::{CompletionError, ConfigError, CoreError, DatabaseError, PracticeError};
pub use evaluator::{ErrorNote, EvaluationOutcome, EvaluationResult, Evaluator};
pub use generator::TaskGenerator;
pub use history::{HistoryEntry, HistoryLog};
pub use integrations::{CompletionClient, GeminiClient};
pub use practice::PracticeService;
pub use secret::SecretStore;
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use task::{Task, TaskKind};
pub use timer::{Resumed, Session, SessionTimer, Snapshot, Tick, TimerState};
pub use wordcount::ValidationWarning;
