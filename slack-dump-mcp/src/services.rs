use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::{Captures, Regex};
use uuid::Uuid;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::api::slackdump::{CommandOutput, CommandRunner};
use crate::error::DumpError;
use crate::models::slackdump::Conversation;
use crate::models::{User, UserDirectory};

// `slackdump list users -no-json` prints a title line and a column header first.
const USER_LIST_HEADER_LINES: usize = 2;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([A-Z0-9]+)>").expect("mention pattern is valid"));

const ENTITY_ESCAPES: [(&str, &str); 4] = [
    (r"\u003c", "<"),
    (r"\u003e", ">"),
    (r"\u0026gt;", ">"),
    (r"\u0026amp;", "&"),
];

/// Drives slackdump for a single request. Holds no state between requests.
pub struct Dumper<R> {
    runner: R,
    temp_dir: PathBuf,
}

impl<R: CommandRunner> Dumper<R> {
    pub fn new(runner: R, temp_dir: PathBuf) -> Self {
        Self { runner, temp_dir }
    }

    /// Dumps the thread at `url` as `"<sender>: <text>"` lines, one per message.
    pub async fn dump(&self, url: &str) -> Result<Vec<String>, DumpError> {
        let users = self.load_users().await?;
        let conversation = self.dump_thread(url).await?;

        info!(
            "dumped {} messages from {} with {} known users",
            conversation.messages.len(),
            url,
            users.len()
        );

        Ok(format_conversation(&conversation, &users))
    }

    pub async fn load_users(&self) -> Result<UserDirectory, DumpError> {
        let output = self.run_checked(&["list", "users", "-no-json"]).await?;
        Ok(parse_users(&output.stdout))
    }

    pub async fn dump_thread(&self, url: &str) -> Result<Conversation, DumpError> {
        let archive = TempArchive::new(&self.temp_dir);
        let path = archive.path().to_string_lossy().into_owned();
        let args = ["dump", "-o", path.as_str(), "-v", url];
        let command = self.runner.command_line(&args);

        self.run_checked(&args).await?;

        let (entry, bytes) = read_dump_json(archive.path())?;
        serde_json::from_slice(&bytes).map_err(|source| DumpError::Decode {
            command,
            entry,
            source,
        })
    }

    async fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, DumpError> {
        let output = self
            .runner
            .run(args)
            .await
            .map_err(|source| DumpError::Exec {
                command: self.runner.command_line(args),
                source,
            })?;

        if output.success {
            return Ok(output);
        }

        let status = match output.code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };
        let mut detail = String::new();
        if !output.stderr.trim().is_empty() {
            detail.push_str("\n- stderr: ");
            detail.push_str(output.stderr.trim());
        }
        if !output.stdout.trim().is_empty() {
            detail.push_str("\n- stdout: ");
            detail.push_str(output.stdout.trim());
        }

        Err(DumpError::CommandFailed {
            command: self.runner.command_line(args),
            status,
            detail,
        })
    }
}

/// Unique archive path under a temp directory, removed when dropped.
struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.zip", Uuid::new_v4())),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Returns the name and contents of the first `.json` entry in the archive,
/// in central directory order.
pub fn read_dump_json(path: &Path) -> Result<(String, Vec<u8>), DumpError> {
    let archive_err = |source: ZipError| DumpError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| archive_err(ZipError::from(e)))?;
    let mut archive = ZipArchive::new(file).map_err(archive_err)?;

    let json_entries: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(".json"))
        .map(str::to_string)
        .collect();
    if json_entries.len() > 1 {
        warn!(
            "{} contains {} JSON files, using the first one",
            path.display(),
            json_entries.len()
        );
    }

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_err)?;
        if !entry.name().ends_with(".json") {
            continue;
        }

        let name = entry.name().to_string();
        debug!("reading {} from {}", name, path.display());

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| DumpError::ArchiveEntry {
                path: path.to_path_buf(),
                entry: name.clone(),
                source,
            })?;
        return Ok((name, bytes));
    }

    Err(DumpError::NoJsonFound {
        path: path.to_path_buf(),
    })
}

/// Parses the tabular output of `slackdump list users -no-json`.
///
/// The header lines are discarded. Each remaining line is `<name> <id>` followed by
/// optional `bot`/`deleted`/`restricted` flags and an email. Lines with fewer than
/// two columns are skipped.
pub fn parse_users(output: &str) -> UserDirectory {
    let mut users = UserDirectory::new();

    for line in output.lines().skip(USER_LIST_HEADER_LINES) {
        let mut cols = line.split_whitespace();
        let (Some(name), Some(id)) = (cols.next(), cols.next()) else {
            warn!("skipping line: {line:?}");
            continue;
        };

        let mut user = User {
            id: id.to_string(),
            name: name.to_string(),
            ..User::default()
        };

        for col in cols {
            if col.eq_ignore_ascii_case("bot") {
                user.is_bot = true;
            }
            if col.eq_ignore_ascii_case("deleted") {
                user.deleted = true;
            }
            if col.eq_ignore_ascii_case("restricted") {
                user.is_restricted = true;
            }
            if col.contains('@') {
                user.email = Some(col.to_string());
            }
        }

        users.insert(user);
    }

    users
}

/// Undoes the few escapes slackdump leaves in message text.
pub fn decode_entities(text: &str) -> String {
    ENTITY_ESCAPES
        .iter()
        .fold(text.to_string(), |acc, &(escaped, plain)| {
            acc.replace(escaped, plain)
        })
}

/// Replaces `<@USERID>` with the user's name. Unknown IDs are left as they are.
pub fn resolve_mentions(text: &str, users: &UserDirectory) -> String {
    MENTION_RE
        .replace_all(text, |caps: &Captures| match users.get(&caps[1]) {
            Some(user) => user.name.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn format_conversation(conversation: &Conversation, users: &UserDirectory) -> Vec<String> {
    conversation
        .messages
        .iter()
        .map(|message| {
            let text = resolve_mentions(&decode_entities(&message.text), users);
            format!("{}: {}", users.sender(message), text)
        })
        .collect()
}
