use super::Executor;
use crate::core::{CommandError, HarnessError, Result};

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs commands as child processes.
///
/// Every call spawns a fresh process; nothing is shared between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn execute(&self, argv: &[String], input: Option<&[u8]>) -> Result<String> {
        let (program, args) = argv.split_first().ok_or(HarnessError::EmptyCommand)?;
        debug!("Running command {:?}", argv);

        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Feed stdin while collecting output so a chatty child cannot block us.
        let stdin = child.stdin.take();
        let feed = async move {
            if let (Some(mut stdin), Some(input)) = (stdin, input) {
                stdin.write_all(input).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        // A child may exit without reading all of its input; only the exit
        // status decides success then.
        let feed = async move {
            match feed.await {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("Command closed stdin before reading all input");
                    Ok(())
                }
                other => other,
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let err = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(
            "Command completed rc={:?} out={:?} err={:?}",
            output.status.code(),
            out,
            err
        );

        if !output.status.success() {
            return Err(CommandError::new(argv, output.status.code(), out, err).into());
        }
        fed?;

        Ok(out)
    }
}
