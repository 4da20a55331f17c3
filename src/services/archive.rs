use crate::domain::constants::{MAX_ZIP_FILE, MOD_FILE, VENDOR_DIR};
use crate::domain::errors::ArchiveError;
use crate::domain::models::{ArchiveFile, FileMode, ModuleVersion};
use crate::git::Repository;
use crate::services::modzip;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::ZipWriter;

/// Produces the module archive of one commit.
pub trait ArchiveBuilder {
    fn build(&self, version: &ModuleVersion, commit: &str) -> Result<Vec<u8>, ArchiveError>;
}

/// Exports the commit as a tar stream and hands the flat file list to the
/// reference builder in `modzip`.
pub struct ReferenceBuilder<'a> {
    repo: &'a dyn Repository,
}

impl<'a> ReferenceBuilder<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }
}

impl ArchiveBuilder for ReferenceBuilder<'_> {
    fn build(&self, version: &ModuleVersion, commit: &str) -> Result<Vec<u8>, ArchiveError> {
        let tar = self.repo.export_tar(commit)?;
        let files = files_from_tar(&tar)?;
        debug!(commit, files = files.len(), "exported tree for reference build");
        modzip::create_from_files(version, files)
    }
}

/// Reads every file and symlink of a tar stream into memory.
///
/// Directories and pax global headers are skipped.
pub fn files_from_tar(tar: &[u8]) -> Result<Vec<ArchiveFile>, ArchiveError> {
    let mut archive = tar::Archive::new(Cursor::new(tar));
    let mut files = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let kind = entry.header().entry_type();
        let mode = if kind.is_file() {
            FileMode::from_unix(entry.header().mode()?)
        } else if kind.is_symlink() {
            FileMode::Symlink
        } else {
            continue;
        };
        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        files.push(ArchiveFile {
            path,
            mode,
            content,
        });
    }
    Ok(files)
}

/// Builds the archive straight from the repository's object store, one blob
/// at a time, without materializing the tree.
pub struct DirectBuilder<'a> {
    repo: &'a dyn Repository,
}

impl<'a> DirectBuilder<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }
}

impl ArchiveBuilder for DirectBuilder<'_> {
    fn build(&self, version: &ModuleVersion, commit: &str) -> Result<Vec<u8>, ArchiveError> {
        let entries = self.repo.files(commit)?;
        let nested_roots: Vec<&str> = entries
            .iter()
            .filter(|e| e.mode.is_file())
            .filter_map(|e| e.path.strip_suffix(MOD_FILE))
            .filter(|dir| dir.ends_with('/'))
            .collect();

        let prefix = version.archive_prefix();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut lowered: HashMap<String, &str> = HashMap::new();
        let mut total = 0u64;
        let mut written = 0usize;
        for e in &entries {
            if !e.mode.is_file() {
                continue;
            }
            let vendored = e.path.split('/').rev().skip(1).any(|d| d == VENDOR_DIR);
            if vendored || nested_roots.iter().any(|root| e.path.starts_with(root)) {
                continue;
            }
            modzip::check_file_path(&e.path)?;
            if let Some(first) = lowered.insert(e.path.to_lowercase(), &e.path) {
                return Err(ArchiveError::CaseCollision {
                    first: first.to_string(),
                    second: e.path.clone(),
                });
            }

            let content = self.repo.read_blob(&e.oid)?;
            let size = content.len() as u64;
            let limit = modzip::size_limit(&e.path);
            if size > limit {
                return Err(ArchiveError::FileTooLarge {
                    path: e.path.clone(),
                    size,
                    limit,
                });
            }
            total += size;
            if total > MAX_ZIP_FILE {
                return Err(ArchiveError::ArchiveTooLarge {
                    limit: MAX_ZIP_FILE,
                });
            }

            writer.start_file(format!("{}{}", prefix, e.path), modzip::entry_options(e.mode))?;
            writer.write_all(&content)?;
            written += 1;
        }
        debug!(commit, files = written, "built module archive from object store");
        Ok(writer.finish()?.into_inner())
    }
}
