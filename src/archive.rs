//! ZIP container unpacking and repacking.
//!
//! Each conversion job unpacks its input into a uniquely named scoped
//! temporary directory, transforms documents in place, and repacks the
//! full tree into a new container carrying the EPUB extension.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding};

/// File extensions treated as markup documents inside a container.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["html", "xhtml", "htm"];

/// Extension carried by repacked containers.
pub const CONTAINER_EXTENSION: &str = "epub";

/// Extract every entry of `archive_path` into a freshly created scoped
/// temporary directory.
///
/// The directory is unique per call, so concurrent jobs never collide
/// even for identically named inputs, and it is removed when the returned
/// [`TempDir`] drops. Fails with [`Error::CorruptArchive`] when the
/// container's central directory cannot be read.
pub fn unpack(archive_path: &Path) -> Result<TempDir> {
    let corrupt = |source| Error::CorruptArchive {
        path: archive_path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(corrupt)?;
    let workdir = tempfile::Builder::new().prefix("embold-").tempdir()?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(corrupt)?;
        // Entries with traversal components cannot escape the working
        // directory; skip them instead of failing the whole archive.
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = workdir.path().join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
    }

    debug!(
        archive = %archive_path.display(),
        workdir = %workdir.path().display(),
        "unpacked container"
    );
    Ok(workdir)
}

/// Recursively find every markup document under `workdir`, in a stable
/// sorted order.
pub fn enumerate_documents(workdir: &Path) -> Vec<PathBuf> {
    WalkDir::new(workdir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    DOCUMENT_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Compress the full tree under `workdir` into `<output_stem>.zip`, then
/// rename the result to carry the container extension.
///
/// Overwrites any pre-existing file at the final path and returns it. The
/// EPUB `mimetype` entry, when present, goes in first and uncompressed as
/// the container format requires.
pub fn repack(workdir: &Path, output_stem: &Path) -> Result<PathBuf> {
    let zip_path = output_stem.with_extension("zip");
    let final_path = output_stem.with_extension(CONTAINER_EXTENSION);
    let failed = |source: io::Error| Error::Repack {
        path: final_path.clone(),
        source,
    };

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let file = File::create(&zip_path).map_err(&failed)?;
    let mut zip = ZipWriter::new(file);

    let mimetype = workdir.join("mimetype");
    if mimetype.is_file() {
        zip.start_file("mimetype", stored)
            .map_err(|e| failed(e.into()))?;
        let data = fs::read(&mimetype).map_err(&failed)?;
        zip.write_all(&data).map_err(&failed)?;
    }

    for entry in WalkDir::new(workdir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(workdir) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");
        if name == "mimetype" {
            continue;
        }
        zip.start_file(name.as_str(), deflated)
            .map_err(|e| failed(e.into()))?;
        let data = fs::read(entry.path()).map_err(&failed)?;
        zip.write_all(&data).map_err(&failed)?;
    }

    zip.finish().map_err(|e| failed(e.into()))?;
    fs::rename(&zip_path, &final_path).map_err(&failed)?;

    debug!(archive = %final_path.display(), "repacked container");
    Ok(final_path)
}

/// Read a document as text, decoding UTF-8 first with the fallback chain
/// used for old ebooks.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    let hint = extract_xml_encoding(&bytes);
    Ok(decode_text(&bytes, hint).into_owned())
}

/// Write a transformed document back in place.
pub fn write_document(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::DocumentWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_unpack_extracts_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("book.epub");
        build_archive(
            &archive,
            &[
                ("mimetype", b"application/epub+zip"),
                ("OEBPS/ch1.html", b"<p>hi</p>"),
            ],
        );

        let workdir = unpack(&archive).unwrap();
        assert_eq!(
            fs::read(workdir.path().join("OEBPS/ch1.html")).unwrap(),
            b"<p>hi</p>"
        );
    }

    #[test]
    fn test_unpack_rejects_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.epub");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = unpack(&archive).unwrap_err();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }

    #[test]
    fn test_enumerate_finds_markup_extensions_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("text")).unwrap();
        fs::write(dir.path().join("text/a.html"), "x").unwrap();
        fs::write(dir.path().join("text/b.XHTML"), "x").unwrap();
        fs::write(dir.path().join("text/c.htm"), "x").unwrap();
        fs::write(dir.path().join("cover.png"), "x").unwrap();
        fs::write(dir.path().join("style.css"), "x").unwrap();

        let documents = enumerate_documents(dir.path());
        let names: Vec<_> = documents
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.html", "b.XHTML", "c.htm"]);
    }

    #[test]
    fn test_repack_writes_mimetype_first_and_stored() {
        let workdir = tempfile::tempdir().unwrap();
        fs::write(workdir.path().join("mimetype"), "application/epub+zip").unwrap();
        fs::create_dir_all(workdir.path().join("OEBPS")).unwrap();
        fs::write(workdir.path().join("OEBPS/ch1.html"), "<p>hi</p>").unwrap();

        let out = tempfile::tempdir().unwrap();
        let final_path = repack(workdir.path(), &out.path().join("b_book")).unwrap();
        assert_eq!(final_path.extension().unwrap(), CONTAINER_EXTENSION);

        let mut archive = ZipArchive::new(File::open(&final_path).unwrap()).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_repack_overwrites_existing_output() {
        let workdir = tempfile::tempdir().unwrap();
        fs::write(workdir.path().join("a.txt"), "fresh").unwrap();

        let out = tempfile::tempdir().unwrap();
        let stem = out.path().join("b_book");
        fs::write(stem.with_extension(CONTAINER_EXTENSION), "stale").unwrap();

        let final_path = repack(workdir.path(), &stem).unwrap();
        let mut archive = ZipArchive::new(File::open(&final_path).unwrap()).unwrap();
        assert!(archive.by_name("a.txt").is_ok());
    }

    #[test]
    fn test_read_document_decodes_windows_1252_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.html");
        // 0xE9 is 'é' in Windows-1252 and invalid as standalone UTF-8.
        fs::write(&path, b"<p>caf\xe9</p>").unwrap();

        assert_eq!(read_document(&path).unwrap(), "<p>café</p>");
    }
}
