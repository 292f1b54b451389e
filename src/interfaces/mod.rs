//! File formats the binary reads and writes.

pub mod catalog_file;
pub mod csv;
