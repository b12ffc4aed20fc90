//! Helpers shared by the integration tests.
//!
//! PDFs are generated with `lopdf` so no binary fixtures are needed. Page `n`
//! (one-based) of a generated file has a MediaBox width of `100 * n`, which
//! makes page order visible after any operation.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use rakupdf::batch::events::NullSink;
use rakupdf::batch::{Batch, BatchCoordinator, BatchSummary, TaskRunner};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Content stream given to every page by [`write_text_pdf`].
pub const PAGE_TEXT: &[u8] = b"BT /F1 12 Tf (Hello) Tj ET";

/// Write a `pages`-page PDF called `name` into `dir`.
pub fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    build_pdf(dir, name, pages, None)
}

/// Like [`write_pdf`], but every page draws [`PAGE_TEXT`].
pub fn write_text_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    build_pdf(dir, name, pages, Some(PAGE_TEXT))
}

fn build_pdf(dir: &Path, name: &str, pages: usize, content: Option<&[u8]>) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (100 * n as i64).into(), 792.into()],
            };
            if let Some(content) = content {
                let stream = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
                page.set("Contents", stream);
            }
            Object::Reference(doc.add_object(page))
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => Dictionary::new(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("failed to write test PDF");
    path
}

fn page_values(path: &Path, read: impl Fn(&Dictionary) -> i64) -> Vec<i64> {
    let doc = Document::load(path).expect("failed to load output PDF");
    doc.get_pages()
        .into_values()
        .map(|id| read(doc.get_dictionary(id).expect("page is not a dictionary")))
        .collect()
}

/// MediaBox widths of every page, in page order.
pub fn widths(path: &Path) -> Vec<i64> {
    page_values(path, |page| {
        let media = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .expect("page has no MediaBox");
        media[2].as_i64().expect("MediaBox width is not an integer")
    })
}

/// `/Rotate` of every page, 0 when absent.
pub fn rotations(path: &Path) -> Vec<i64> {
    page_values(path, |page| {
        page.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0)
    })
}

/// Decoded content of every page, in page order.
pub fn page_contents(path: &Path) -> Vec<Vec<u8>> {
    let doc = Document::load(path).expect("failed to load output PDF");
    doc.get_pages()
        .into_values()
        .map(|id| doc.get_page_content(id).expect("page content is unreadable"))
        .collect()
}

/// Whether the trailer of the file at `path` names an encryption dictionary.
pub fn is_encrypted(path: &Path) -> bool {
    Document::load(path)
        .expect("failed to load output PDF")
        .is_encrypted()
}

/// Run a batch on the current thread and return its summary.
pub fn run_batch<R: TaskRunner>(runner: R, batch: Batch) -> BatchSummary {
    BatchCoordinator::new(runner)
        .run(batch, &NullSink, &CancellationToken::new())
        .expect("coordinator was idle")
}
