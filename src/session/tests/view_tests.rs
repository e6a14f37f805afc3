//! Tests for display order, paging and the thumbnail and progress views.

use std::path::PathBuf;
use std::sync::Arc;

use super::{img, label, session_with};
use crate::message::Event;
use crate::model::LabelingMode;
use crate::planner::ViewMode;
use crate::probability::ProbabilityTable;
use crate::session::SessionError;

fn many(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("img_{:02}.png", i)).collect()
}

#[test]
fn test_sort_and_hide_scenario() {
    let mut session = session_with(&["a.png", "b.png", "c.png"]);
    label(&mut session, 0, &["a.png"]);
    label(&mut session, 1, &["c.png"]);

    session.update(Event::Sort).unwrap();
    assert_eq!(session.order(), [0, 2, 1]);

    session.update(Event::ToggleHide).unwrap();
    assert_eq!(session.view(), ViewMode::Hide);
    assert_eq!(session.order(), [1]);

    session.update(Event::ToggleHide).unwrap();
    assert_eq!(session.view(), ViewMode::None);
    assert_eq!(session.order(), [0, 1, 2]);
}

#[test]
fn test_hide_follows_label_changes() {
    let mut session = session_with(&["a.png", "b.png"]);
    session.update(Event::ToggleHide).unwrap();

    label(&mut session, 0, &["b.png"]);
    assert_eq!(session.order(), [0]);

    session.update(Event::SelectPaths(vec![img("b.png")])).unwrap();
    session.update(Event::Unlabel).unwrap();
    assert_eq!(session.order(), [0, 1]);

    session.update(Event::ResetView).unwrap();
    assert_eq!(session.view(), ViewMode::None);
}

#[test]
fn test_paging_clamps() {
    let files = many(20);
    let mut session = session_with(&files).with_geometry(2, 3);
    assert_eq!(session.page_size(), 6);
    assert_eq!(session.page_count(), 4);

    session.update(Event::PrevPage).unwrap();
    assert_eq!(session.page(), 0);
    for _ in 0..10 {
        session.update(Event::NextPage).unwrap();
    }
    assert_eq!(session.page(), 3);
    assert_eq!(session.thumbnails().len(), 2);
}

#[test]
fn test_order_change_resets_page() {
    let files = many(10);
    let mut session = session_with(&files).with_geometry(1, 4);
    session.update(Event::NextPage).unwrap();
    assert_eq!(session.page(), 1);

    session.update(Event::Sort).unwrap();
    // nothing is labeled, so sorting keeps the order and the page
    assert_eq!(session.page(), 1);

    session.update(Event::ToggleHide).unwrap();
    session.update(Event::NextPage).unwrap();
    label(&mut session, 0, &[&files[0]]);
    assert_eq!(session.page(), 0);
}

#[test]
fn test_toggle_thumbnail_on_current_page() {
    let files = many(10);
    let mut session = session_with(&files).with_geometry(1, 4);
    session.update(Event::NextPage).unwrap();

    session.update(Event::ToggleThumbnail(1)).unwrap();
    assert_eq!(session.selection(), [img(&files[5])]);

    session.update(Event::ToggleThumbnail(1)).unwrap();
    assert!(session.selection().is_empty());

    // past the page and past the list
    session.update(Event::ToggleThumbnail(4)).unwrap();
    session.update(Event::NextPage).unwrap();
    session.update(Event::ToggleThumbnail(3)).unwrap();
    assert!(session.selection().is_empty());
}

#[test]
fn test_set_thumbnail_columns() {
    let mut session = session_with(&["a.png"]);
    session.update(Event::SetThumbnailColumns(5)).unwrap();
    assert_eq!(session.columns(), 5);
    assert_eq!(
        session.update(Event::SetThumbnailColumns(0)),
        Err(SessionError::InvalidColumns(0))
    );
    assert_eq!(
        session.update(Event::SetThumbnailColumns(6)),
        Err(SessionError::InvalidColumns(6))
    );
    assert_eq!(session.columns(), 5);
}

#[test]
fn test_thumbnails_report_label_and_selection() {
    let mut session = session_with(&["a.png", "b.png"]);
    label(&mut session, 1, &["a.png"]);
    session.update(Event::SelectPaths(vec![img("b.png")])).unwrap();
    session.update(Event::SetShowHostPaths(true)).unwrap();

    let thumbs = session.thumbnails();
    assert_eq!(thumbs.len(), 2);
    assert_eq!(thumbs[0].path, PathBuf::from("/home/user/data/a.png"));
    assert_eq!(thumbs[0].label, Some(1));
    assert_eq!(thumbs[0].label_name.as_deref(), Some("B"));
    assert_eq!(thumbs[0].color, Some(session.labels().color(1)));
    assert!(!thumbs[0].selected);

    assert_eq!(thumbs[1].label, None);
    assert_eq!(thumbs[1].color, None);
    assert!(thumbs[1].selected);
    assert!(thumbs[1].scores.is_none());
}

#[test]
fn test_thumbnails_show_scores_in_coach_mode() {
    let table = ProbabilityTable::from_csv_str("filename,cat,dog\na.png,0.25,0.75\n").unwrap();
    let mut session = session_with(&["a.png", "b.png"]).with_probabilities(Arc::new(table));
    assert!(session.thumbnails()[0].scores.is_none());

    session.update(Event::SwitchMode(LabelingMode::MlCoach)).unwrap();
    let thumbs = session.thumbnails();
    assert_eq!(thumbs[0].scores.as_deref(), Some("cat: 25.0\ndog: 75.0"));
    assert!(thumbs[1].scores.is_none());
}

#[test]
fn test_progress() {
    let mut session = session_with(&["a.png", "b.png", "c.png", "d.png"]);
    assert_eq!(session.progress().to_string(), "Labeled 0 out of 4 images.");

    label(&mut session, 0, &["a.png", "b.png"]);
    label(&mut session, 2, &["d.png"]);

    let progress = session.progress();
    assert_eq!(progress.to_string(), "Labeled 3 out of 4 images.");
    let counts: Vec<usize> = progress.labels.iter().map(|l| l.count).collect();
    assert_eq!(counts, vec![2, 0, 1]);
    assert_eq!(progress.labels[0].percent, 50.0);
    assert_eq!(progress.labels[2].name, "C");
}
