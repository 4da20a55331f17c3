use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};

/// The "h1:" hash of a set of named blobs.
///
/// Each blob contributes the line `"<sha256 hex>  <name>\n"`; the lines are
/// sorted, concatenated and hashed again. Input order does not matter.
pub fn hash_named_blobs<N, C>(blobs: impl IntoIterator<Item = (N, C)>) -> String
where
    N: AsRef<str>,
    C: AsRef<[u8]>,
{
    let mut lines: Vec<String> = blobs
        .into_iter()
        .map(|(name, content)| {
            format!(
                "{}  {}\n",
                hex::encode(Sha256::digest(content.as_ref())),
                name.as_ref()
            )
        })
        .collect();
    lines.sort();

    let mut summary = Sha256::new();
    for line in &lines {
        summary.update(line.as_bytes());
    }
    format!("h1:{}", BASE64_STANDARD.encode(summary.finalize()))
}

/// Decodes a module archive in memory and hashes its entries.
pub fn hash_zip(archive: &[u8]) -> anyhow::Result<String> {
    let blobs = read_zip_entries(archive)?;
    Ok(hash_named_blobs(blobs))
}

/// `(name, content)` for every member of a zip archive, in archive order.
pub fn read_zip_entries(archive: &[u8]) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).context("opening module zip")?;
    let mut out = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut member = zip
            .by_index(i)
            .with_context(|| format!("reading zip member {}", i))?;
        let name = member.name().to_string();
        if name.contains('\n') {
            bail!("dirhash: filenames with newlines are not supported");
        }
        let mut content = Vec::with_capacity(member.size() as usize);
        member
            .read_to_end(&mut content)
            .with_context(|| format!("reading zip member {:?}", name))?;
        out.push((name, content));
    }
    Ok(out)
}

/// Names of every member of a zip archive, in archive order.
pub fn zip_names(archive: &[u8]) -> anyhow::Result<Vec<String>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).context("opening module zip")?;
    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let member = zip
            .by_index(i)
            .with_context(|| format!("reading zip member {}", i))?;
        names.push(member.name().to_string());
    }
    Ok(names)
}
