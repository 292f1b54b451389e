//! Domain types of the routing engine and the ports its stores implement.

pub mod biller;
pub mod gateway;
pub mod money;
pub mod ports;
pub mod quota;
pub mod transaction;
