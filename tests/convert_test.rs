use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use embold::{
    BatchOptions, CancelToken, DOCUMENT_HEADER, JobOutcome, ProgressEvent, run_batch,
};

const CHAPTER: &str =
    "<html><head><title>One</title></head><body><p>Silent reading practice</p></body></html>";

const COVER_PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

fn build_epub(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create archive");
    let mut zip = ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, data) in entries {
        zip.start_file(*name, deflated).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    entry.read_to_end(&mut data).unwrap();
    data
}

fn collect_events(inputs: Vec<PathBuf>, dest: &Path, workers: usize) -> Vec<ProgressEvent> {
    let handle = run_batch(
        inputs,
        dest,
        BatchOptions {
            workers,
            ..BatchOptions::default()
        },
        CancelToken::new(),
    )
    .expect("batch starts");
    handle.events().collect()
}

#[test]
fn test_single_archive_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.epub");
    build_epub(
        &input,
        &[
            ("OEBPS/chapter1.html", CHAPTER.as_bytes()),
            ("OEBPS/cover.png", COVER_PNG),
        ],
    );
    let dest = dir.path().join("out");

    let events = collect_events(vec![input], &dest, 1);

    let output = dest.join("b_book.epub");
    assert!(output.is_file(), "expected output archive at {output:?}");

    // The document is transformed: fixed header, words bolded, tags kept.
    let chapter = String::from_utf8(read_entry(&output, "OEBPS/chapter1.html")).unwrap();
    assert!(chapter.starts_with(DOCUMENT_HEADER));
    assert!(chapter.contains("<p><b>Sil</b>ent <b>rea</b>ding <b>pra</b>ctice</p>"));
    assert!(chapter.contains("<title><b>O</b>ne</title>"));

    // Entries other than transformed documents are byte-identical.
    assert_eq!(read_entry(&output, "OEBPS/cover.png"), COVER_PNG);
    assert_eq!(
        read_entry(&output, "mimetype"),
        b"application/epub+zip".to_vec()
    );

    // The job completes with one transformed document and full progress.
    assert!(events.contains(&ProgressEvent::JobStarted { job_id: 0 }));
    assert!(events.contains(&ProgressEvent::JobFinished {
        job_id: 0,
        outcome: JobOutcome::Completed { documents: 1 },
    }));
    let document_progress: f64 = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::DocumentProgress { increment, .. } => Some(*increment),
            _ => None,
        })
        .sum();
    assert!((document_progress - 1.0).abs() < 1e-9);
    assert_eq!(events.last(), Some(&ProgressEvent::BatchFinished));
}

#[test]
fn test_mixed_batch_with_documentless_archive() {
    let dir = tempfile::tempdir().unwrap();
    let with_docs = dir.path().join("book.epub");
    build_epub(&with_docs, &[("OEBPS/chapter1.html", CHAPTER.as_bytes())]);
    let without_docs = dir.path().join("empty.epub");
    build_epub(&without_docs, &[("OEBPS/cover.png", COVER_PNG)]);
    let dest = dir.path().join("out");

    let events = collect_events(vec![with_docs, without_docs], &dest, 2);

    // Only the archive with documents produces an output file.
    assert!(dest.join("b_book.epub").is_file());
    assert!(!dest.join("b_empty.epub").exists());

    assert!(events.iter().any(|event| matches!(
        event,
        ProgressEvent::Log(line) if line == "No markup documents found in empty.epub"
    )));
    assert!(events.contains(&ProgressEvent::JobFinished {
        job_id: 0,
        outcome: JobOutcome::Completed { documents: 1 },
    }));
    assert!(events.contains(&ProgressEvent::JobFinished {
        job_id: 1,
        outcome: JobOutcome::Completed { documents: 0 },
    }));

    // Overall progress reaches 100% counting both jobs.
    let overall: f64 = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::JobProgress { increment } => Some(*increment),
            _ => None,
        })
        .sum();
    assert!((overall - 1.0).abs() < 1e-9);
    assert!(events.iter().any(|event| matches!(
        event,
        ProgressEvent::Log(line) if line == "All EPUB files processed successfully."
    )));
    assert_eq!(events.last(), Some(&ProgressEvent::BatchFinished));
}

#[test]
fn test_corrupt_archive_fails_without_aborting_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.epub");
    build_epub(&good, &[("OEBPS/chapter1.html", CHAPTER.as_bytes())]);
    let bad = dir.path().join("bad.epub");
    std::fs::write(&bad, b"definitely not a zip").unwrap();
    let dest = dir.path().join("out");

    let events = collect_events(vec![bad, good], &dest, 1);

    assert!(matches!(
        events
            .iter()
            .find_map(|event| match event {
                ProgressEvent::JobFinished { job_id: 0, outcome } => Some(outcome.clone()),
                _ => None,
            })
            .unwrap(),
        JobOutcome::Failed { .. }
    ));
    assert!(events.iter().any(|event| matches!(
        event,
        ProgressEvent::Log(line) if line.starts_with("Bad EPUB archive bad.epub")
    )));

    // The sibling job still completes and produces its output.
    assert!(events.contains(&ProgressEvent::JobFinished {
        job_id: 1,
        outcome: JobOutcome::Completed { documents: 1 },
    }));
    assert!(dest.join("b_good.epub").is_file());
}

#[test]
fn test_per_job_event_order_is_causal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.epub");
    build_epub(&input, &[("OEBPS/chapter1.html", CHAPTER.as_bytes())]);
    let dest = dir.path().join("out");

    let events = collect_events(vec![input], &dest, 1);

    let started = events
        .iter()
        .position(|event| matches!(event, ProgressEvent::JobStarted { job_id: 0 }))
        .unwrap();
    let extracted = events
        .iter()
        .position(|event| {
            matches!(event, ProgressEvent::Log(line) if line.starts_with("Extracted"))
        })
        .unwrap();
    let document = events
        .iter()
        .position(|event| matches!(event, ProgressEvent::DocumentProgress { .. }))
        .unwrap();
    let finished = events
        .iter()
        .position(|event| matches!(event, ProgressEvent::JobFinished { job_id: 0, .. }))
        .unwrap();

    assert!(started < extracted);
    assert!(extracted < document);
    assert!(document < finished);
}
