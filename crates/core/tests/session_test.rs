//! Session lifecycle tests: background build, atomic install, serialized
//! interaction from several threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use textlens_core::{
    Color, HighlightSession, ImageRect, ImageSize, RevisionObserver, TextBlock, TextElement,
    TextLine, TextRecognition,
};

fn grid_recognition(rows: usize, cols: usize) -> Arc<TextRecognition> {
    let blocks = (0..rows)
        .map(|row| {
            let top = row as f64 * 20.0;
            let elements = (0..cols)
                .map(|col| {
                    let left = col as f64 * 20.0;
                    TextElement::new(
                        format!("r{row}c{col}"),
                        Some(ImageRect::new(left, top, left + 15.0, top + 15.0)),
                    )
                })
                .collect();
            TextBlock::new(
                "",
                Some(ImageRect::new(0.0, top, cols as f64 * 20.0, top + 15.0)),
                vec![TextLine::new(
                    "",
                    Some(ImageRect::new(0.0, top, cols as f64 * 20.0, top + 15.0)),
                    elements,
                )],
            )
        })
        .collect();
    Arc::new(TextRecognition::new(blocks))
}

#[derive(Default)]
struct LastRevision(AtomicU64);

impl RevisionObserver for LastRevision {
    fn on_revision(&self, revision: u64) {
        self.0.store(revision, Ordering::SeqCst);
    }
}

#[test]
fn test_background_build_then_install() {
    let observer = Arc::new(LastRevision::default());
    let session = Arc::new(Mutex::new(HighlightSession::default()));

    let job = {
        let mut guard = session.lock().unwrap();
        guard.subscribe(observer.clone());
        guard.load_image(grid_recognition(30, 20), ImageSize::new(400.0, 600.0).unwrap());
        guard.set_view_size(400.0, 600.0).unwrap();
        guard.begin_build().unwrap()
    };

    let built = thread::spawn(move || job.run()).join().unwrap().unwrap();
    assert_eq!(built.tree().element_count(), 600);

    let mut guard = session.lock().unwrap();
    assert!(guard.tree().is_none());
    assert!(guard.install_tree(built));
    assert_eq!(guard.tree().unwrap().element_count(), 600);
    assert_eq!(observer.0.load(Ordering::SeqCst), guard.revision());
}

#[test]
fn test_concurrent_taps_are_serialized() {
    let session = Arc::new(Mutex::new(HighlightSession::default()));
    {
        let mut guard = session.lock().unwrap();
        guard.load_image(grid_recognition(10, 10), ImageSize::new(200.0, 200.0).unwrap());
        guard.set_view_size(200.0, 200.0).unwrap();
        assert!(guard.ensure_tree().unwrap());
    }
    let start_revision = session.lock().unwrap().revision();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for i in 0..25 {
                    // Centers of the cells on this worker's diagonal band.
                    let x = ((worker * 25 + i) % 10) as f64 * 20.0 + 7.0;
                    let y = ((worker * 25 + i) / 10) as f64 * 20.0 + 7.0;
                    let mut guard = session.lock().unwrap();
                    if worker % 2 == 0 {
                        guard.tap((x, y)).unwrap();
                    } else {
                        guard.drag((x, y)).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let guard = session.lock().unwrap();
    assert_eq!(guard.revision(), start_revision + 100);
    let tree = guard.tree().unwrap();
    assert!(
        tree.elements()
            .all(|(_, e)| e.color() == Color::TAP || e.color() == Color::DRAG)
    );
}

#[test]
fn test_new_image_replaces_tree() {
    let mut session = HighlightSession::default();
    session.load_image(grid_recognition(2, 2), ImageSize::new(100.0, 100.0).unwrap());
    session.set_view_size(100.0, 100.0).unwrap();
    session.ensure_tree().unwrap();
    session.tap((7.0, 7.0)).unwrap();
    session.apply_gesture(2.0, 5.0, 5.0).unwrap();

    session.load_image(grid_recognition(3, 3), ImageSize::new(100.0, 100.0).unwrap());
    assert!(session.tree().is_none());
    assert_eq!(session.zoom(), 1.0);
    assert!(session.ensure_tree().unwrap());
    let tree = session.tree().unwrap();
    assert_eq!(tree.element_count(), 9);
    assert!(tree.elements().all(|(_, e)| e.color() == Color::HIGHLIGHT));
}
