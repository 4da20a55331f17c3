use crate::domain::errors::{ArchiveError, VerifyError};
use crate::domain::models::ModuleVersion;
use crate::services::archive::ArchiveBuilder;
use crate::services::dirhash::{hash_zip, zip_names};
use anyhow::Context;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Builds the commit's module archive with both builders and requires their
/// h1 hashes to match.
///
/// `reference` is the trusted implementation, `direct` the one the server
/// publishes with. Content problems reported by either builder are policy
/// violations; any other failure is internal. On a hash mismatch both archives
/// are decoded to describe the difference.
pub fn check_archive_equivalence(
    reference: &dyn ArchiveBuilder,
    direct: &dyn ArchiveBuilder,
    version: &ModuleVersion,
    commit: &str,
) -> Result<(), VerifyError> {
    let want = reference
        .build(version, commit)
        .map_err(|e| classify(e, "building reference module archive"))?;
    let got = direct
        .build(version, commit)
        .map_err(|e| classify(e, "building module archive"))?;

    let want_hash = hash_zip(&want).context("hashing reference module archive")?;
    let got_hash = hash_zip(&got).context("hashing module archive")?;
    if want_hash == got_hash {
        debug!(commit, hash = %got_hash, "module archives match");
        return Ok(());
    }
    warn!(commit, %want_hash, %got_hash, "module archive hashes differ");

    let prefix = version.archive_prefix();
    let want_names = stripped_names(&want, &prefix).context("listing reference module archive")?;
    let got_names = stripped_names(&got, &prefix).context("listing module archive")?;
    match name_diff(&want_names, &got_names) {
        None => Err(VerifyError::policy(format!(
            "zip hashes don't match: got {}, want {}",
            got_hash, want_hash
        ))),
        Some(diff) => Err(VerifyError::policy(format!(
            "commit has files that can't be included in module (-want +got):\n\n{}",
            diff
        ))),
    }
}

fn classify(err: ArchiveError, action: &str) -> VerifyError {
    if err.is_content() {
        VerifyError::Policy(err.to_string())
    } else {
        VerifyError::Internal(anyhow::Error::new(err).context(action.to_string()))
    }
}

fn stripped_names(archive: &[u8], prefix: &str) -> anyhow::Result<BTreeSet<String>> {
    Ok(zip_names(archive)?
        .into_iter()
        .map(|n| n.strip_prefix(prefix).map(str::to_string).unwrap_or(n))
        .collect())
}

/// Line diff of two name sets: `- name` only in `want`, `+ name` only in
/// `got`. `None` when the sets are equal.
pub fn name_diff(want: &BTreeSet<String>, got: &BTreeSet<String>) -> Option<String> {
    if want == got {
        return None;
    }
    let mut lines: Vec<(&str, char)> = want
        .difference(got)
        .map(|n| (n.as_str(), '-'))
        .chain(got.difference(want).map(|n| (n.as_str(), '+')))
        .collect();
    lines.sort();
    Some(
        lines
            .iter()
            .map(|(name, sign)| format!("{} {}", sign, name))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
