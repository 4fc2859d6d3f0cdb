pub mod command;
pub mod executor;

pub use command::CommandExecutor;
pub use executor::{Executor, argv};
