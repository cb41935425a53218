pub mod config;
pub mod scenario;
pub mod simulate;
pub mod watch;
