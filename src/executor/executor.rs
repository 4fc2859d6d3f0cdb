use crate::core::Result;

use async_trait::async_trait;

/// Boundary to the external storage tooling.
///
/// Implementations run one command to completion and return its trimmed
/// stdout, or fail with [`crate::core::CommandError`] when it exits non-zero.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executor name for debugging
    fn name(&self) -> &'static str;

    async fn execute(&self, argv: &[String], input: Option<&[u8]>) -> Result<String>;
}

/// Builds an owned argv from string-like parts.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
