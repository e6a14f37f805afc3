//! Scenario tests for the session transition function.
//!
//! Each test drives a [`Session`](super::Session) through a sequence of events
//! the way a user would and checks the resulting state.

mod confirmation_tests;
mod view_tests;

use std::path::PathBuf;

use super::Session;
use crate::files::{FileEntry, ImportFormat};
use crate::message::Event;
use crate::paths::PathNamespace;

/// Container path of a test image.
fn img(name: &str) -> PathBuf {
    PathBuf::from(format!("/app/data/{}", name))
}

fn import_event<S: AsRef<str>>(names: &[S]) -> Event {
    Event::Import {
        selection: names.iter().map(|n| FileEntry::file(img(n.as_ref()))).collect(),
        format: ImportFormat::images(),
    }
}

/// A manual session with `names` imported and labels A, B, C.
fn session_with<S: AsRef<str>>(names: &[S]) -> Session {
    let namespace = PathNamespace::new("/app/data", "/home/user/data");
    let mut session = Session::new(namespace, &["A", "B", "C"]);
    session.update(import_event(names)).unwrap();
    session
}

/// An empty manual session.
fn empty_session() -> Session {
    session_with::<&str>(&[])
}

/// Select `names` and press `label`.
fn label<S: AsRef<str>>(session: &mut Session, label: usize, names: &[S]) {
    session
        .update(Event::SelectPaths(names.iter().map(|n| img(n.as_ref())).collect()))
        .unwrap();
    session.update(Event::PressLabel(label)).unwrap();
}
