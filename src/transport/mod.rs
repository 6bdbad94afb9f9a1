/// Filesystem helpers for race data directories.
pub mod fs;
