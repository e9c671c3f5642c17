//! Reconcile command implementation

use backoff::ExponentialBackoff;
use colored::Colorize;
use dredger_api::ObjectKey;
use dredger_core::{ConfigurationStore, ReconcileOutcome, Reconciler};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run one pass over every stored record.
///
/// Retryable failures are redelivered with exponential backoff, bounded by
/// the configured elapsed time. Every record is attempted even if some
/// fail.
pub fn run_reconcile(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let manager = ctx.manager()?;
    if ctx.settings.clean_on_start {
        manager.clean_all()?;
    }
    let reconciler = ctx.reconciler(store.clone(), manager);

    let keys: Vec<ObjectKey> = store.list()?.iter().map(|conf| conf.key()).collect();
    if keys.is_empty() {
        println!("{}", "No records".dimmed());
        return Ok(());
    }

    let mut failed = 0usize;
    for key in &keys {
        match reconcile_with_retry(ctx, &reconciler, key) {
            Ok(outcome) => {
                println!(
                    "{} {} {}",
                    "✓".green(),
                    key.to_string().cyan(),
                    describe(outcome)
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {} {}", "✗".red(), key.to_string().cyan(), e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} records failed to reconcile",
            keys.len()
        )));
    }
    Ok(())
}

fn reconcile_with_retry(
    ctx: &Context,
    reconciler: &Reconciler,
    key: &ObjectKey,
) -> std::result::Result<ReconcileOutcome, dredger_core::Error> {
    let policy = ExponentialBackoff {
        max_elapsed_time: Some(ctx.settings.retry_max_elapsed()),
        ..ExponentialBackoff::default()
    };

    let op = || {
        reconciler.reconcile(key).map_err(|e| {
            if e.is_retryable() {
                tracing::warn!(key = %key, error = %e, "reconcile failed, will retry");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    };

    backoff::retry(policy, op).map_err(|e| match e {
        backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => err,
    })
}

fn describe(outcome: ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::Gone => "gone",
        ReconcileOutcome::Skipped => "awaiting removal",
        ReconcileOutcome::Finalized => "removed",
        ReconcileOutcome::Abandoned => "abandoned",
        ReconcileOutcome::Synced {
            status_updated: true,
        } => "synchronized",
        ReconcileOutcome::Synced {
            status_updated: false,
        } => "up to date",
    }
}
