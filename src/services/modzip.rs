//! Reference module archive builder.
//!
//! Works on a flat list of files and applies every rule of the module
//! archive format before writing anything:
//!
//! 0. the module path itself must be well formed
//! 1. only regular and executable files are candidates
//! 2. files below a `vendor` directory are excluded
//! 3. subdirectories holding their own `go.mod` are excluded wholesale
//! 4. paths must be valid, case-insensitively unique, and within size limits
//!
//! Entries are written sorted by path under `<module>@<version>/`.

use crate::domain::constants::{
    LICENSE_FILE, MAX_FILE_SIZE, MAX_GO_MOD, MAX_LICENSE, MAX_ZIP_FILE, MOD_FILE, VENDOR_DIR,
};
use crate::domain::errors::ArchiveError;
use crate::domain::models::{ArchiveFile, FileMode, ModuleVersion};
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const PATH_PUNCTUATION: &str = " !#$%&()+,-.=@[]^_{}~";

pub fn create_from_files(
    version: &ModuleVersion,
    files: Vec<ArchiveFile>,
) -> Result<Vec<u8>, ArchiveError> {
    check_module_path(&version.path)?;
    let files: Vec<ArchiveFile> = files.into_iter().filter(|f| f.mode.is_file()).collect();

    let nested_modules: BTreeSet<String> = files
        .iter()
        .filter_map(|f| f.path.strip_suffix(&format!("/{}", MOD_FILE)))
        .map(|dir| format!("{}/", dir))
        .collect();

    let mut included = Vec::new();
    let mut folded: HashMap<String, String> = HashMap::new();
    let mut total = 0u64;
    for f in files {
        if in_vendor_dir(&f.path) || nested_modules.iter().any(|d| f.path.starts_with(d)) {
            continue;
        }
        check_file_path(&f.path)?;
        if let Some(first) = folded.insert(f.path.to_lowercase(), f.path.clone()) {
            return Err(ArchiveError::CaseCollision {
                first,
                second: f.path,
            });
        }
        let size = f.content.len() as u64;
        let limit = size_limit(&f.path);
        if size > limit {
            return Err(ArchiveError::FileTooLarge {
                path: f.path,
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
        included.push(f);
    }
    included.sort_by(|a, b| a.path.cmp(&b.path));

    let prefix = version.archive_prefix();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for f in &included {
        writer.start_file(format!("{}{}", prefix, f.path), entry_options(f.mode))?;
        writer.write_all(&f.content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Zip options shared by both builders: deflate, fixed timestamp.
pub fn entry_options(mode: FileMode) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(if mode == FileMode::Executable { 0o755 } else { 0o644 })
}

/// Largest size allowed for the file at `path`.
pub fn size_limit(path: &str) -> u64 {
    match path {
        MOD_FILE => MAX_GO_MOD,
        LICENSE_FILE => MAX_LICENSE,
        _ => MAX_FILE_SIZE,
    }
}

fn in_vendor_dir(path: &str) -> bool {
    let mut dirs: Vec<&str> = path.split('/').collect();
    dirs.pop();
    dirs.contains(&VENDOR_DIR)
}

/// Validates a module path such as `example.com/m`.
///
/// Elements use letters, digits and `-._~`; the first element must look like
/// a domain name.
pub fn check_module_path(path: &str) -> Result<(), ArchiveError> {
    let invalid = |reason: &str| ArchiveError::InvalidModulePath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("empty string"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid("leading or trailing slash"));
    }
    for elem in path.split('/') {
        if elem.is_empty() {
            return Err(invalid("double slash"));
        }
        if elem.starts_with('.') || elem.ends_with('.') {
            return Err(invalid("leading or trailing dot in path element"));
        }
        if !elem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-._~".contains(c))
        {
            return Err(invalid("invalid char in path element"));
        }
    }
    let first = path.split('/').next().unwrap_or_default();
    if !first.contains('.') {
        return Err(invalid("missing dot in first path element"));
    }
    if first.starts_with('-') {
        return Err(invalid("leading dash in first path element"));
    }
    if first.chars().any(|c| c.is_ascii_uppercase() || c == '_' || c == '~') {
        return Err(invalid("invalid char in first path element"));
    }
    Ok(())
}

/// Validates a slash-separated file path relative to the module root.
pub fn check_file_path(path: &str) -> Result<(), ArchiveError> {
    let invalid = |reason: String| ArchiveError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("empty path".to_string()));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid("leading or trailing slash".to_string()));
    }
    for elem in path.split('/') {
        if elem.is_empty() {
            return Err(invalid("empty path element".to_string()));
        }
        if elem == "." || elem == ".." {
            return Err(invalid(format!("invalid path element {:?}", elem)));
        }
        if elem.ends_with('.') {
            return Err(invalid("trailing dot in path element".to_string()));
        }
        if let Some(c) = elem
            .chars()
            .find(|c| !c.is_alphanumeric() && !PATH_PUNCTUATION.contains(*c))
        {
            return Err(invalid(format!("invalid char {:?}", c)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_file_path, check_module_path, create_from_files};
    use crate::domain::errors::ArchiveError;
    use crate::domain::models::{ArchiveFile, FileMode, ModuleVersion};
    use crate::services::dirhash::zip_names;

    fn version() -> ModuleVersion {
        ModuleVersion {
            path: "example.com/m".to_string(),
            version: "v0.0.0-20210304050607-abc123abc123".to_string(),
        }
    }

    fn f(path: &str, content: &str) -> ArchiveFile {
        ArchiveFile {
            path: path.to_string(),
            mode: FileMode::Regular,
            content: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn writes_sorted_prefixed_entries() {
        let zip = create_from_files(
            &version(),
            vec![f("main.go", "package main"), f("LICENSE", "MIT"), f("a/b.go", "package a")],
        )
        .unwrap();
        let p = "example.com/m@v0.0.0-20210304050607-abc123abc123/";
        assert_eq!(
            zip_names(&zip).unwrap(),
            vec![format!("{}LICENSE", p), format!("{}a/b.go", p), format!("{}main.go", p)]
        );
    }

    #[test]
    fn skips_vendor_nested_modules_and_non_files() {
        let link = ArchiveFile {
            path: "link".to_string(),
            mode: FileMode::Symlink,
            content: b"LICENSE".to_vec(),
        };
        let zip = create_from_files(
            &version(),
            vec![
                f("LICENSE", "MIT"),
                f("vendor/x/y.go", "package y"),
                f("sub/go.mod", "module example.com/m/sub"),
                f("sub/z.go", "package z"),
                f("subway/keep.go", "package subway"),
                link,
            ],
        )
        .unwrap();
        let names: Vec<String> = zip_names(&zip)
            .unwrap()
            .into_iter()
            .map(|n| n.rsplit_once('/').map(|(_, b)| b.to_string()).unwrap_or(n))
            .collect();
        assert_eq!(names, vec!["LICENSE", "keep.go"]);
    }

    #[test]
    fn rejects_case_collisions() {
        let err = create_from_files(&version(), vec![f("README", "a"), f("readme", "b")])
            .unwrap_err();
        assert!(err.is_content());
        assert!(matches!(err, ArchiveError::CaseCollision { .. }));
    }

    #[test]
    fn rejects_oversized_license() {
        let big = "x".repeat((16 << 20) + 1);
        let err = create_from_files(&version(), vec![f("LICENSE", &big)]).unwrap_err();
        assert!(matches!(err, ArchiveError::FileTooLarge { .. }), "{}", err);
    }

    #[test]
    fn path_rules() {
        for ok in ["LICENSE", "a/b.go", "docs/with space.md", "x/@v/{y}.txt"] {
            assert!(check_file_path(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "/abs", "dir/", "a//b", "a/../b", "a/./b", "name.", "what?", "tab\there"] {
            let err = check_file_path(bad).unwrap_err();
            assert!(err.is_content(), "{}", bad);
        }
        assert_eq!(
            check_file_path("what?").unwrap_err().to_string(),
            "file path \"what?\": invalid char '?'"
        );
    }

    #[test]
    fn malformed_module_path_is_a_content_error() {
        let empty = ModuleVersion {
            path: String::new(),
            version: version().version,
        };
        let err = create_from_files(&empty, vec![f("LICENSE", "MIT")]).unwrap_err();
        assert!(err.is_content(), "{}", err);
        assert_eq!(err.to_string(), "malformed module path \"\": empty string");
    }

    #[test]
    fn module_path_rules() {
        assert!(check_module_path("example.com/m").is_ok());
        assert!(check_module_path("github.com/user/repo-v2.x").is_ok());
        for bad in ["", "m", "/example.com", "example.com/", "example.com//m", "Example.com/m", "example.com/.m", "example.com/a b"] {
            assert!(
                matches!(check_module_path(bad), Err(ArchiveError::InvalidModulePath { .. })),
                "{:?}",
                bad
            );
        }
    }
}
