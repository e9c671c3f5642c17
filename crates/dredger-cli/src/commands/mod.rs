//! Command implementations for dredger-cli

pub mod apply;
pub mod delete;
pub mod reconcile;
pub mod reset;
pub mod status;

pub use apply::run_apply;
pub use delete::run_delete;
pub use reconcile::run_reconcile;
pub use reset::run_reset;
pub use status::run_status;
