use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// Settings threaded through a hook run.
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub module_path: String,
    pub git_timeout: std::time::Duration,
}

/// One line of pre-receive input: `<old> <new> <ref>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub old_revision: String,
    pub new_revision: String,
    pub ref_name: String,
}

/// A commit as read from history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub parents: Vec<String>,
    /// Committer timestamp, seconds since the Unix epoch.
    pub committer_time: i64,
    pub message: String,
}

impl Commit {
    /// First paragraph of the message on a single line.
    pub fn subject(&self) -> String {
        let paragraph = match self.message.find("\n\n") {
            Some(i) => &self.message[..i],
            None => &self.message,
        };
        paragraph.trim().replace('\n', " ")
    }

    pub fn short_id(&self) -> &str {
        let n = crate::domain::constants::SHORT_REVISION_LEN.min(self.id.len());
        &self.id[..n]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    Regular,
    Executable,
    Symlink,
    Directory,
    Submodule,
}

impl FileMode {
    /// Maps a git tree mode (`100644`, `040000`, ...) to a `FileMode`.
    pub fn from_git(mode: &str) -> Option<FileMode> {
        match mode {
            "100644" | "100664" => Some(FileMode::Regular),
            "100755" => Some(FileMode::Executable),
            "120000" => Some(FileMode::Symlink),
            "040000" | "40000" => Some(FileMode::Directory),
            "160000" => Some(FileMode::Submodule),
            _ => None,
        }
    }

    /// Maps a unix permission/type word, as found in tar headers.
    pub fn from_unix(mode: u32) -> FileMode {
        if mode & 0o111 != 0 {
            FileMode::Executable
        } else {
            FileMode::Regular
        }
    }

    pub fn is_file(self) -> bool {
        matches!(self, FileMode::Regular | FileMode::Executable)
    }
}

/// An entry of a commit's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: FileMode,
    pub oid: String,
}

/// A file handed to the reference archive builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: String,
    pub mode: FileMode,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

impl ModuleVersion {
    /// Prefix of every entry name in this version's module archive.
    pub fn archive_prefix(&self) -> String {
        format!("{}@{}/", self.path, self.version)
    }
}

impl std::fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedCommit {
    pub id: String,
    pub subject: String,
    pub version: ModuleVersion,
    pub errors: Vec<String>,
}

impl VerifiedCommit {
    pub fn is_bad(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    pub commits: Vec<VerifiedCommit>,
    pub bad_count: usize,
}

impl RunResult {
    pub fn push(&mut self, commit: VerifiedCommit) {
        if commit.is_bad() {
            self.bad_count += 1;
        }
        self.commits.push(commit);
    }

    pub fn accepted(&self) -> bool {
        self.bad_count == 0
    }
}
