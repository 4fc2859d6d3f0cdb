pub mod cancel;
pub mod error;

pub use cancel::CancellationSignal;
pub use error::{CommandError, HarnessError, Result};
