pub mod config;
pub mod history;
pub mod key;
pub mod submit;
pub mod task;
pub mod timer;
