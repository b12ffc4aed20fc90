//! Reordering and rotating pages of real files.

use rakupdf::batch::{Batch, BatchTask, PdfTaskRunner, TaskKind};
use rakupdf::document::LopdfDocument;
use rakupdf::engine::{ReorderEngine, ReorderScript};
use rakupdf::pages::{PageMove, PageOrderModel};
use tempfile::TempDir;

use crate::common::{rotations, run_batch, widths, write_pdf};

#[test]
fn test_model_snapshot_is_written() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "four.pdf", 4);
    let out = dir.path().join("four_reordered.pdf");

    let mut model = PageOrderModel::new(4);
    model.select_all_of(&[0, 2]);
    assert!(model.apply(PageMove::Down));
    model.rotate(90).unwrap();
    assert_eq!(model.order(), &[1, 0, 3, 2]);

    let doc = LopdfDocument::load(&source).unwrap();
    let outcome = ReorderEngine::reorder_model(&doc, &model)
        .unwrap()
        .write(&out)
        .unwrap();

    assert_eq!(outcome.output_pages, 4);
    assert_eq!(widths(&out), vec![200, 100, 400, 300]);
    assert_eq!(rotations(&out), vec![0, 90, 0, 90]);
}

#[test]
fn test_script_through_batch() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "slides.pdf", 5);
    let out = dir.path().join("slides_reordered.pdf");

    let script = ReorderScript {
        order: Some("5, 1-3".to_string()),
        select: Some("2".to_string()),
        moves: vec![PageMove::ToTop],
        rotate: Some(-90),
    };
    let summary = run_batch(
        PdfTaskRunner::without_compressor(),
        Batch::Files(vec![BatchTask::new(source, out.clone(), TaskKind::Reorder(script))]),
    );

    assert_eq!(summary.succeeded, 1, "{:?}", summary.outcomes);
    assert_eq!(widths(&out), vec![200, 500, 100, 300]);
    assert_eq!(rotations(&out), vec![270, 0, 0, 0]);
}

#[test]
fn test_rotation_adds_to_existing() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(dir.path(), "one.pdf", 2);
    let once = dir.path().join("once.pdf");
    let twice = dir.path().join("twice.pdf");

    let rotate = |src, dst| {
        let script = ReorderScript {
            rotate: Some(180),
            ..ReorderScript::default()
        };
        run_batch(
            PdfTaskRunner::without_compressor(),
            Batch::Files(vec![BatchTask::new(src, dst, TaskKind::Reorder(script))]),
        )
    };

    assert_eq!(rotate(source, once.clone()).succeeded, 1);
    assert_eq!(rotate(once, twice.clone()).succeeded, 1);
    assert_eq!(rotations(&twice), vec![0, 0]);
}
