//! In-memory `Repository` used by unit tests.

use super::Repository;
use crate::domain::constants::ZERO_REVISION;
use crate::domain::models::{Commit, FileMode, TreeEntry};
use anyhow::{anyhow, bail};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone)]
pub struct MemFile {
    pub mode: FileMode,
    pub content: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryRepo {
    commits: HashMap<String, Commit>,
    trees: HashMap<String, BTreeMap<String, MemFile>>,
    exports: HashMap<String, BTreeMap<String, MemFile>>,
    fail_export: bool,
}

pub fn file(content: &str) -> MemFile {
    MemFile {
        mode: FileMode::Regular,
        content: content.as_bytes().to_vec(),
    }
}

pub fn symlink(target: &str) -> MemFile {
    MemFile {
        mode: FileMode::Symlink,
        content: target.as_bytes().to_vec(),
    }
}

/// A 40-char hex id derived from a short label, e.g. `id("a1")`.
pub fn id(label: &str) -> String {
    let hex: String = label.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("{:0<40}", hex)
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_commit(
        &mut self,
        label: &str,
        parents: &[&str],
        committer_time: i64,
        message: &str,
        files: &[(&str, MemFile)],
    ) -> String {
        let commit_id = id(label);
        let tree: BTreeMap<String, MemFile> = files
            .iter()
            .map(|(p, f)| (p.to_string(), f.clone()))
            .collect();
        self.commits.insert(
            commit_id.clone(),
            Commit {
                id: commit_id.clone(),
                parents: parents.iter().map(|p| id(p)).collect(),
                committer_time,
                message: message.to_string(),
            },
        );
        self.trees.insert(commit_id.clone(), tree);
        commit_id
    }

    /// Makes `export_tar` disagree with the tree for one path.
    pub fn tamper_export(&mut self, commit: &str, path: &str, replacement: Option<MemFile>) {
        let mut export = self.exports_for(commit);
        match replacement {
            Some(f) => export.insert(path.to_string(), f),
            None => export.remove(path),
        };
        self.exports.insert(commit.to_string(), export);
    }

    pub fn fail_exports(&mut self) {
        self.fail_export = true;
    }

    fn exports_for(&self, commit: &str) -> BTreeMap<String, MemFile> {
        self.exports
            .get(commit)
            .or_else(|| self.trees.get(commit))
            .cloned()
            .unwrap_or_default()
    }

    fn tree(&self, commit: &str) -> anyhow::Result<&BTreeMap<String, MemFile>> {
        self.trees
            .get(commit)
            .ok_or_else(|| anyhow!("object {} not found", commit))
    }
}

impl Repository for MemoryRepo {
    fn walk(&self, old: &str, new: &str) -> anyhow::Result<Vec<Commit>> {
        if new == ZERO_REVISION {
            return Ok(vec![]);
        }
        let mut out = Vec::new();
        let mut cursor = Some(new.to_string());
        while let Some(rev) = cursor {
            if rev == old {
                break;
            }
            let c = self.commit(&rev)?;
            cursor = c.parents.first().cloned();
            out.push(c);
        }
        out.reverse();
        Ok(out)
    }

    fn commit(&self, revision: &str) -> anyhow::Result<Commit> {
        self.commits
            .get(revision)
            .cloned()
            .ok_or_else(|| anyhow!("bad revision {:?}", revision))
    }

    fn stat(&self, commit: &str, path: &str) -> anyhow::Result<Option<TreeEntry>> {
        let tree = self.tree(commit)?;
        if let Some(f) = tree.get(path) {
            return Ok(Some(TreeEntry {
                path: path.to_string(),
                mode: f.mode,
                oid: format!("{}:{}", commit, path),
            }));
        }
        let dir = format!("{}/", path);
        if tree.keys().any(|p| p.starts_with(&dir)) {
            return Ok(Some(TreeEntry {
                path: path.to_string(),
                mode: FileMode::Directory,
                oid: format!("{}:{}", commit, path),
            }));
        }
        Ok(None)
    }

    fn files(&self, commit: &str) -> anyhow::Result<Vec<TreeEntry>> {
        Ok(self
            .tree(commit)?
            .iter()
            .map(|(p, f)| TreeEntry {
                path: p.clone(),
                mode: f.mode,
                oid: format!("{}:{}", commit, p),
            })
            .collect())
    }

    fn read_blob(&self, oid: &str) -> anyhow::Result<Vec<u8>> {
        let (commit, path) = oid
            .split_once(':')
            .ok_or_else(|| anyhow!("bad blob id {:?}", oid))?;
        self.tree(commit)?
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| anyhow!("blob {} not found", oid))
    }

    fn export_tar(&self, commit: &str) -> anyhow::Result<Vec<u8>> {
        if self.fail_export {
            bail!("`git archive --format=tar {}` failed: broken pipe", commit);
        }
        self.tree(commit)?;
        let mut builder = tar::Builder::new(Vec::new());

        let mut global = tar::Header::new_ustar();
        let comment = format!("52 comment={}\n", commit);
        global.set_entry_type(tar::EntryType::XGlobalHeader);
        global.set_size(comment.len() as u64);
        global.set_mode(0o666);
        global.set_cksum();
        builder.append_data(&mut global, "pax_global_header", comment.as_bytes())?;

        let mut dirs = std::collections::BTreeSet::new();
        for (path, f) in self.exports_for(commit) {
            let mut parent = std::path::Path::new(&path).parent();
            while let Some(p) = parent.filter(|p| !p.as_os_str().is_empty()) {
                if dirs.insert(p.to_path_buf()) {
                    let mut h = tar::Header::new_ustar();
                    h.set_entry_type(tar::EntryType::Directory);
                    h.set_mode(0o775);
                    h.set_size(0);
                    h.set_cksum();
                    builder.append_data(&mut h, p, std::io::empty())?;
                }
                parent = p.parent();
            }

            let mut h = tar::Header::new_ustar();
            match f.mode {
                FileMode::Symlink => {
                    h.set_entry_type(tar::EntryType::Symlink);
                    h.set_mode(0o777);
                    h.set_size(0);
                    let target = String::from_utf8_lossy(&f.content).into_owned();
                    builder.append_link(&mut h, &path, target)?;
                }
                mode => {
                    h.set_entry_type(tar::EntryType::Regular);
                    h.set_mode(if mode == FileMode::Executable { 0o775 } else { 0o664 });
                    h.set_size(f.content.len() as u64);
                    h.set_cksum();
                    builder.append_data(&mut h, &path, f.content.as_slice())?;
                }
            }
        }
        Ok(builder.into_inner()?)
    }
}
