//! Reset command implementation

use colored::Colorize;

use crate::context::Context;
use crate::error::Result;

/// Remove the named files, or everything under the root when no names are
/// given.
pub fn run_reset(ctx: &Context, names: &[String]) -> Result<()> {
    let manager = ctx.manager()?;
    if names.is_empty() {
        manager.clean_all()?;
        println!("{} {}", "Cleaned".green(), manager.root().display());
    } else {
        manager.reset(names)?;
        println!("{} {} entries", "Removed".green(), names.len());
    }
    Ok(())
}
