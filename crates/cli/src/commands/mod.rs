//! CLI command implementations

pub mod decode;
pub mod discover;
pub mod init;
pub mod run;
