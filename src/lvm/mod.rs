pub mod commands;
pub mod config;
pub mod naming;

pub use commands::LvmCommands;
pub use config::{LvmVersion, detect_lvm_config, lvm_config, lvm_version};
