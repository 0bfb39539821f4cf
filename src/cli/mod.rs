//! CLI command handling

pub mod init;
pub mod start;

pub use init::*;
pub use start::*;
