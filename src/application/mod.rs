//! Application layer containing the routing and charging orchestration.
//!
//! [`router::RoutingEngine`] is the entry point callers use: it narrows the catalog
//! with [`filter`], ranks what is left with [`scorer`], and commits the winner through
//! [`recorder::TransactionRecorder`], whose ledger commit is the only write path.

pub mod filter;
pub mod recorder;
pub mod reporting;
pub mod router;
pub mod scorer;
