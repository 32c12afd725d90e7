mod engine;

pub use engine::{remaining_secs, Resumed, Session, SessionTimer, Snapshot, Tick, TimerState};
