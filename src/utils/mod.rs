//! Utility modules: developer trace capture and logging setup.
pub mod devlog;
pub mod logger;
