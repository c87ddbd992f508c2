//! Library half of the `rosteraudit` binary.
//!
//! `audit` runs the load/normalize/reconcile pipeline, `render` turns findings
//! into the console transcript, and `worker` runs audits off the UI thread.

pub mod audit;
pub mod render;
pub mod worker;
