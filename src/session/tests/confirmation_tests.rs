//! Tests for actions that wait for confirmation.

use super::{empty_session, img, import_event, label, session_with};
use crate::files::{FileEntry, ImportFormat};
use crate::message::Event;
use crate::session::PendingAction;

#[test]
fn test_import_without_labels_runs_immediately() {
    let mut session = session_with(&["a.png"]);
    session.update(import_event(&["x.png", "y.png"])).unwrap();
    assert!(session.pending().is_none());
    assert_eq!(session.files(), [img("x.png"), img("y.png")]);
}

#[test]
fn test_import_with_labels_waits_for_confirmation() {
    let mut session = session_with(&["a.png"]);
    label(&mut session, 0, &["a.png"]);

    session.update(import_event(&["x.png"])).unwrap();
    assert!(matches!(session.pending(), Some(PendingAction::Import { .. })));
    assert_eq!(session.files(), [img("a.png")]);

    session.update(Event::Cancel).unwrap();
    assert!(session.pending().is_none());
    assert_eq!(session.store().total(), 1);

    session.update(import_event(&["x.png"])).unwrap();
    session.update(Event::Confirm).unwrap();
    assert!(session.pending().is_none());
    assert!(session.store().is_empty());
    assert_eq!(session.files(), [img("x.png")]);
    assert_eq!(session.order(), [0]);
}

#[test]
fn test_import_translates_host_paths_and_drops_duplicates() {
    let mut session = empty_session();
    session
        .update(Event::Import {
            selection: vec![
                FileEntry::file("/home/user/data/a.png"),
                FileEntry::file(img("a.png")),
            ],
            format: ImportFormat::images(),
        })
        .unwrap();
    assert_eq!(session.files(), [img("a.png")]);
}

#[test]
fn test_unlabel_all() {
    let mut session = session_with(&["a.png", "b.png"]);
    session.update(Event::UnlabelAll).unwrap();
    assert!(session.pending().is_none(), "nothing labeled, nothing to confirm");

    label(&mut session, 0, &["a.png"]);
    label(&mut session, 1, &["b.png"]);
    session.update(Event::UnlabelAll).unwrap();
    assert_eq!(session.pending(), Some(&PendingAction::UnlabelAll));
    assert_eq!(session.store().total(), 2);

    session.update(Event::Confirm).unwrap();
    assert!(session.store().is_empty());
    assert_eq!(session.files().len(), 2);
}

#[test]
fn test_clear_data() {
    let mut session = session_with(&["a.png"]);
    label(&mut session, 0, &["a.png"]);

    session.update(Event::ClearData).unwrap();
    assert_eq!(session.files().len(), 1);
    session.update(Event::Confirm).unwrap();
    assert!(session.files().is_empty());
    assert!(session.store().is_empty());
    assert!(session.order().is_empty());
}

#[test]
fn test_confirm_without_pending_is_noop() {
    let mut session = session_with(&["a.png"]);
    session.update(Event::Confirm).unwrap();
    session.update(Event::Cancel).unwrap();
    assert_eq!(session.files(), [img("a.png")]);
}
