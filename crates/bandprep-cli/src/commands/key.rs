use clap::Subcommand;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store the API key
    Set {
        /// Gemini API key
        key: String,
    },
    /// Report whether a key is stored
    Status,
    /// Remove the stored key
    Clear,
}

pub fn run(action: KeyAction) -> CliResult {
    let ctx = Context::load()?;
    let secrets = bandprep_core::SecretStore::new(ctx.store.clone());

    match action {
        KeyAction::Set { key } => {
            if key.trim().is_empty() {
                return Err("Please enter a valid API key".into());
            }
            secrets.set(&key)?;
            println!("API key saved");
        }
        KeyAction::Status => match secrets.get() {
            Some(_) => println!("API key loaded"),
            None => println!("no API key stored"),
        },
        KeyAction::Clear => {
            secrets.clear()?;
            println!("API key removed");
        }
    }
    Ok(())
}
