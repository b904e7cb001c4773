//! Statement ingestion: parsed rows to position and contribution
//! series, plus partial-history reconciliation.

pub mod position;
pub mod reconcile;
pub mod rows;
