//! Apply command implementation

use std::path::Path;

use colored::Colorize;
use dredger_api::Configuration;
use dredger_core::{ConfigurationStore, validate, validate_key};
use dredger_fs::ConfigStore;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Create the record described by `file`, or replace the spec of the
/// stored record with the same key.
pub fn run_apply(ctx: &Context, file: &Path) -> Result<()> {
    let doc: Configuration = ConfigStore::new().load(file)?;
    let key = doc.key();
    validate_key(&key).map_err(|e| CliError::user(format!("{}: {e}", file.display())))?;
    validate(&doc.spec).map_err(dredger_core::Error::from)?;

    let store = ctx.store()?;
    match store.get(&key) {
        Ok(mut current) => {
            if current.metadata.is_deleting() {
                return Err(CliError::user(format!("{key} is being deleted")));
            }
            if current.spec == doc.spec {
                println!("{} {} (unchanged)", "=".dimmed(), key.to_string().cyan());
                return Ok(());
            }
            current.spec = doc.spec;
            store.update(&current)?;
            println!("{} {} updated", "~".yellow(), key.to_string().cyan());
        }
        Err(e) if e.is_not_found() => {
            store.create(Configuration::new(&key, doc.spec))?;
            println!("{} {} created", "+".green(), key.to_string().cyan());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
