//! Pseudo-versions: `v0.0.0-20210304050607-abc123abc123` and friends.
//!
//! Forms, for a revision committed at `ts` with short id `rev`:
//! - no earlier version: `vX.0.0-ts-rev`
//! - latest earlier version `vX.Y.Z`: `vX.Y.(Z+1)-0.ts-rev`
//! - latest earlier version `vX.Y.Z-pre`: `vX.Y.Z-pre.0.ts-rev`
//! - build metadata of the earlier version (`+incompatible`) is kept as a suffix.

use chrono::{DateTime, NaiveDateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub fn pseudo_version(older: &str, time: DateTime<Utc>, revision: &str) -> String {
    pseudo_version_with_major("", older, time, revision)
}

/// Like `pseudo_version`, with an explicit major (`v2`) used when there is no
/// earlier version. An empty major means `v0`.
pub fn pseudo_version_with_major(
    major: &str,
    older: &str,
    time: DateTime<Utc>,
    revision: &str,
) -> String {
    let major = if major.is_empty() { "v0" } else { major };
    let segment = format!("{}-{}", time.format(TIMESTAMP_FORMAT), revision);

    let Some(older) = Semver::parse(older) else {
        return format!("{}.0.0-{}", major, segment);
    };
    let build = older.build.as_deref().map(|b| format!("+{}", b)).unwrap_or_default();
    match &older.prerelease {
        Some(pre) => format!(
            "v{}.{}.{}-{}.0.{}{}",
            older.major, older.minor, older.patch, pre, segment, build
        ),
        None => format!(
            "v{}.{}.{}-0.{}{}",
            older.major,
            older.minor,
            inc_decimal(&older.patch),
            segment,
            build
        ),
    }
}

/// Reports whether `v` has the shape of a pseudo-version.
pub fn is_pseudo_version(v: &str) -> bool {
    let Some(semver) = Semver::parse(v) else {
        return false;
    };
    let Some(pre) = semver.prerelease else {
        return false;
    };
    let Some((head, rev)) = pre.rsplit_once('-') else {
        return false;
    };
    let ts = head.rsplit('.').next().unwrap_or(head);
    let shape_ok = head == ts || head.ends_with(&format!("0.{}", ts));
    shape_ok
        && ts.len() == 14
        && ts.bytes().all(|b| b.is_ascii_digit())
        && !rev.is_empty()
        && rev.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// The commit time embedded in a pseudo-version.
pub fn pseudo_version_time(v: &str) -> Option<DateTime<Utc>> {
    if !is_pseudo_version(v) {
        return None;
    }
    let pre = Semver::parse(v)?.prerelease?;
    let (head, _) = pre.rsplit_once('-')?;
    let ts = head.rsplit('.').next()?;
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .ok()
        .map(|t| t.and_utc())
}

/// Decimal string increment: "9" -> "10", "199" -> "200".
fn inc_decimal(decimal: &str) -> String {
    let mut digits: Vec<u8> = decimal.bytes().collect();
    let mut i = digits.len();
    while i > 0 {
        i -= 1;
        if digits[i] == b'9' {
            digits[i] = b'0';
        } else {
            digits[i] += 1;
            return String::from_utf8_lossy(&digits).into_owned();
        }
    }
    let mut out = String::from("1");
    out.push_str(&String::from_utf8_lossy(&digits));
    out
}

/// A `v`-prefixed semantic version; `v1` and `v1.2` are accepted as
/// shorthands for `v1.0.0` and `v1.2.0`.
#[derive(Debug, PartialEq, Eq)]
struct Semver {
    major: String,
    minor: String,
    patch: String,
    prerelease: Option<String>,
    build: Option<String>,
}

impl Semver {
    fn parse(v: &str) -> Option<Semver> {
        let rest = v.strip_prefix('v')?;
        let (rest, build) = match rest.split_once('+') {
            Some((r, b)) => (r, Some(b)),
            None => (rest, None),
        };
        if let Some(b) = build {
            if !dot_idents_ok(b, false) {
                return None;
            }
        }
        let (core, prerelease) = match rest.split_once('-') {
            Some((c, p)) => (c, Some(p)),
            None => (rest, None),
        };
        if let Some(p) = prerelease {
            if !dot_idents_ok(p, true) {
                return None;
            }
        }

        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 || !parts.iter().all(|p| numeric_ok(p)) {
            return None;
        }
        // shorthand forms cannot carry a prerelease or build
        if parts.len() < 3 && (prerelease.is_some() || build.is_some()) {
            return None;
        }
        Some(Semver {
            major: parts[0].to_string(),
            minor: parts.get(1).unwrap_or(&"0").to_string(),
            patch: parts.get(2).unwrap_or(&"0").to_string(),
            prerelease: prerelease.map(str::to_string),
            build: build.map(str::to_string),
        })
    }
}

fn numeric_ok(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

fn dot_idents_ok(s: &str, strict_numbers: bool) -> bool {
    s.split('.').all(|ident| {
        !ident.is_empty()
            && ident.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && (!strict_numbers || !ident.bytes().all(|b| b.is_ascii_digit()) || numeric_ok(ident))
    })
}
