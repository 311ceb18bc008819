#![allow(dead_code)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use slack_dump_mcp::api::slackdump::{CommandOutput, CommandRunner};
use slack_dump_mcp::mcp::SlackDumpServer;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;
use zip::write::SimpleFileOptions;

pub const USERS_OUTPUT: &str = "\
Users
Name       ID          Bot?  Deleted?  Restricted?  Email
alice      U123        bot
bob        U456                                     bob@example.com
carol      U789              deleted   restricted
";

/// Stands in for the slackdump binary.
///
/// `list` prints `users_output`. `dump` writes `archive` (if any) to the `-o` path,
/// then exits with `dump_exit_code`.
#[derive(Clone)]
pub struct FakeRunner {
    pub users_output: String,
    pub archive: Option<Vec<(String, String)>>,
    pub dump_exit_code: i32,
    pub spawn_fails: bool,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeRunner {
    pub fn with_conversation(json: &str) -> Self {
        Self::with_entries(vec![("C0123456789-1234567890.json", json)])
    }

    pub fn with_entries(entries: Vec<(&str, &str)>) -> Self {
        Self {
            users_output: USERS_OUTPUT.to_string(),
            archive: Some(
                entries
                    .into_iter()
                    .map(|(name, body)| (name.to_string(), body.to_string()))
                    .collect(),
            ),
            dump_exit_code: 0,
            spawn_fails: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Archive path passed to the last `dump` invocation.
    pub fn dump_path(&self) -> Option<PathBuf> {
        self.calls()
            .into_iter()
            .rev()
            .find(|args| args.first().map(String::as_str) == Some("dump"))
            .map(|args| PathBuf::from(&args[2]))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    fn program(&self) -> &str {
        "slackdump"
    }

    async fn run(&self, args: &[&str]) -> io::Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(|arg| arg.to_string()).collect());

        if self.spawn_fails {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            ));
        }

        match args.first().copied() {
            Some("list") => Ok(CommandOutput {
                stdout: self.users_output.clone(),
                code: Some(0),
                success: true,
                ..CommandOutput::default()
            }),
            Some("dump") => {
                if let Some(entries) = &self.archive {
                    write_zip(Path::new(args[2]), entries)?;
                }
                if self.dump_exit_code != 0 {
                    return Ok(CommandOutput {
                        stderr: "invalid thread url".to_string(),
                        code: Some(self.dump_exit_code),
                        success: false,
                        ..CommandOutput::default()
                    });
                }
                Ok(CommandOutput {
                    code: Some(0),
                    success: true,
                    ..CommandOutput::default()
                })
            }
            _ => Err(io::Error::other(format!("unexpected args {args:?}"))),
        }
    }
}

pub fn write_zip(path: &Path, entries: &[(String, String)]) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, body) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(io::Error::other)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish().map_err(io::Error::other)?;

    Ok(())
}

pub const THREAD_JSON: &str = r#"{
  "name": "general",
  "channel_id": "C0123456789",
  "thread_ts": "1234567890.000100",
  "messages": [
    { "user": "U123", "text": "hey <@U456>, can you look at this?", "ts": "1234567890.000100" },
    { "user": "U456", "text": "sure \\u003c@U123\\u003e \\u0026amp; <@U999>", "ts": "1234567891.000100" },
    { "user": "UNKNOWN1", "text": "drive-by", "ts": "1234567892.000100" }
  ]
}"#;

/// Line-delimited JSON-RPC client talking to a server over an in-memory pipe.
pub struct McpClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl McpClient {
    pub fn connect(server: SlackDumpServer) -> (Self, JoinHandle<Result<(), rmcp::RmcpError>>) {
        let (client_end, server_end) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_end);
        let handle = tokio::spawn(server.serve_io(server_read, server_write));

        let (client_read, writer) = tokio::io::split(client_end);
        let client = Self {
            lines: BufReader::new(client_read).lines(),
            writer,
        };
        (client, handle)
    }

    pub async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Sends a request and waits for the response carrying the same id.
    pub async fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;

        loop {
            let line = tokio::time::timeout(Duration::from_secs(10), self.lines.next_line())
                .await
                .expect("no response in time")
                .unwrap()
                .expect("server closed the stream");
            let message: Value = serde_json::from_str(&line).unwrap();
            if message["id"] == json!(id) {
                return message;
            }
        }
    }

    /// Runs the initialize handshake and returns the initialize response.
    pub async fn initialize(&mut self) -> Value {
        let response = self
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "slack-dump-mcp-tests", "version": "0.0.0" },
                }),
            )
            .await;
        self.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
        response
    }

    pub async fn close(mut self) {
        self.writer.shutdown().await.unwrap();
    }
}
