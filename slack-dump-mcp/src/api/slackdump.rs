use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

/// Runs the slackdump tool. Swapped for a fake in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Executable name, used for error messages.
    fn program(&self) -> &str;

    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput>;

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn program(&self) -> &str {
        (**self).program()
    }

    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(args).await
    }
}

pub struct SlackdumpCli {
    binary: String,
    timeout: Option<Duration>,
}

impl SlackdumpCli {
    pub fn new(binary: String, timeout: Option<Duration>) -> Self {
        Self { binary, timeout }
    }
}

#[async_trait]
impl CommandRunner for SlackdumpCli {
    fn program(&self) -> &str {
        &self.binary
    }

    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        info!("running {}", self.command_line(args));

        // Dropping the future (request cancelled or timed out) kills the child.
        let mut command = Command::new(&self.binary);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        let child = command.output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("timed out after {limit:?}"),
                )
            })??,
            None => child.await?,
        };

        debug!("{} {:?}: status = {}", self.binary, args, output.status);

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
            success: output.status.success(),
        })
    }
}
