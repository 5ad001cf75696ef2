//! Release archive decoding
//!
//! Releases are shipped as gzip-compressed tar streams. The stream is read
//! once, front to back; directory entries are skipped and regular files are
//! stored under their archive name.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use shipkit_core::Release;
use tar::{Archive, Builder, Header};

use crate::error::{RepoError, Result};

fn corrupt(e: impl std::fmt::Display) -> RepoError {
    RepoError::ArchiveCorrupt {
        message: e.to_string(),
    }
}

/// Decode a tar.gz stream into `release`, keeping archive order
///
/// Returns the number of files read.
pub fn read_release_archive<R: Read>(reader: R, release: &mut Release) -> Result<usize> {
    let decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(decoder);
    let mut count = 0;

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(corrupt)?.to_string_lossy().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(corrupt)?;

        release.insert(path, data);
        count += 1;
    }

    Ok(count)
}

/// Encode the manifests of a release as a tar.gz stream
pub fn write_release_archive(release: &Release) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for (path, content) in &release.manifests {
        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder.append_data(&mut header, path, content.as_slice())?;
    }

    let mut encoder = builder.into_inner()?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_release() -> Release {
        let mut release = Release::new("5", "1.0.0");
        release.insert("app/manifests/web.yaml", b"kind: Deployment\n".to_vec());
        release.insert("app/manifests/db.yaml", b"kind: StatefulSet\n".to_vec());
        release
    }

    #[test]
    fn test_read_archive() {
        let data = write_release_archive(&sample_release()).unwrap();

        let mut release = Release::new("5", "1.0.0");
        let count = read_release_archive(data.as_slice(), &mut release).unwrap();

        assert_eq!(count, 2);
        let paths: Vec<_> = release.manifests.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["app/manifests/web.yaml", "app/manifests/db.yaml"]);
        assert_eq!(release.manifests["app/manifests/db.yaml"], b"kind: StatefulSet\n");
    }

    #[test]
    fn test_directories_skipped() {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);

        let mut dir = Header::new_gnu();
        dir.set_entry_type(tar::EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_cksum();
        builder.append_data(&mut dir, "app/", std::io::empty()).unwrap();

        let mut file = Header::new_gnu();
        file.set_size(3);
        file.set_mode(0o644);
        file.set_cksum();
        builder.append_data(&mut file, "app/a.txt", &b"abc"[..]).unwrap();

        let data = builder.into_inner().unwrap().finish().unwrap();

        let mut release = Release::default();
        assert_eq!(read_release_archive(data.as_slice(), &mut release).unwrap(), 1);
        assert!(release.manifests.contains_key("app/a.txt"));
    }

    #[test]
    fn test_not_gzip() {
        let mut release = Release::default();
        let err = read_release_archive(&b"definitely not gzip"[..], &mut release).unwrap_err();
        assert!(matches!(err, RepoError::ArchiveCorrupt { .. }));
    }
}
