//! Shared setup for commands: config, database and the practice service.

use std::sync::Arc;

use bandprep_core::{Config, Database, GeminiClient, KvStore, PracticeService};
use tracing::debug;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub struct Context {
    pub config: Config,
    pub store: Arc<dyn KvStore>,
}

impl Context {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let store: Arc<dyn KvStore> = Arc::new(Database::open()?);
        debug!(model = %config.api.model, "context loaded");
        Ok(Self { config, store })
    }

    /// Build the service. Opening it reconciles any persisted session.
    pub fn service(&self) -> Result<PracticeService, Box<dyn std::error::Error>> {
        let client = Arc::new(GeminiClient::new(&self.config.api)?);
        Ok(PracticeService::open(self.store.clone(), client))
    }
}

/// Text from `--text` or the file named by `--file` (`-` for stdin).
pub fn read_input(
    text: Option<String>,
    file: Option<std::path::PathBuf>,
) -> Result<String, Box<dyn std::error::Error>> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) if path.as_os_str() == "-" => {
            Ok(std::io::read_to_string(std::io::stdin())?)
        }
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (None, None) => Err("provide --text or --file".into()),
    }
}
