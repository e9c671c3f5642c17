//! Delete command implementation

use colored::Colorize;
use dredger_api::ObjectKey;
use dredger_core::ConfigurationStore;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Request deletion of a record. The file itself is removed by the next
/// reconcile pass.
pub fn run_delete(ctx: &Context, name: &str, namespace: Option<&str>) -> Result<()> {
    let key = match namespace {
        Some(ns) => ObjectKey::namespaced(ns, name),
        None => ObjectKey::new(name),
    };

    let store = ctx.store()?;
    match store.delete(&key) {
        Ok(()) => {
            println!("{} {} deletion requested", "-".red(), key.to_string().cyan());
            Ok(())
        }
        Err(e) if e.is_not_found() => Err(CliError::user(format!("{key} not found"))),
        Err(e) => Err(e.into()),
    }
}
