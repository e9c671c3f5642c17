//! Status command implementation

use crate::context::Context;
use crate::error::Result;

/// Print the observed state of `target` as JSON.
pub fn run_status(ctx: &Context, target: &str) -> Result<()> {
    let manager = ctx.manager()?;
    let outcome = manager.status(target);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
