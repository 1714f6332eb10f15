use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::display::{describe, display_from_fields};
use super::model::{Track, TrackId};
use super::scan::{find_cover, is_audio_file};
use super::*;
use crate::config::{LibrarySettings, TrackDisplayField};

#[test]
fn display_from_fields_can_format_artist_title() {
    let p = Path::new("/tmp/Song.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];
    assert_eq!(
        display_from_fields(p, "Song", Some("  Artist  "), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(p, "Song", None, None, &fields, " - "),
        "Song"
    );
    assert_eq!(
        display_from_fields(p, "Song", None, Some("LP"), &[TrackDisplayField::Album, TrackDisplayField::Filename], "|"),
        "LP|Song"
    );
}

#[test]
fn describe_uses_scanner_display_by_default() {
    let mut t = Track::new("/music/a.mp3", "Song");
    t.artist = Some("Band".into());
    t.display = "Band - Song".into();

    assert_eq!(describe(&t, &[TrackDisplayField::Display], " - "), "Band - Song");
    assert_eq!(
        describe(&t, &[TrackDisplayField::Title, TrackDisplayField::Artist], " / "),
        "Song / Band"
    );
}

#[test]
fn track_ids_follow_the_source_path() {
    let a = Track::new("/music/a.mp3", "A");
    let b = Track::new("/music/a.mp3", "Other title");
    let c = Track::new("/music/c.mp3", "A");
    assert_eq!(a.id, b.id);
    assert_ne!(a.id, c.id);
    assert_eq!(a.id, TrackId::from_path(Path::new("/music/a.mp3")));
    assert_eq!(a.id.to_string().len(), 16);
}

#[test]
fn rename_updates_title_and_display() {
    let mut t = Track::new("/music/a.mp3", "Old");
    t.display = "Band - Old".into();
    t.rename("New");
    assert_eq!(t.title, "New");
    assert_eq!(t.display, "Band - New");
}

#[test]
fn empty_source_is_not_playable() {
    assert!(!Track::new("", "Nothing").has_source());
    assert!(Track::new("/x.mp3", "X").has_source());
}

#[test]
fn is_audio_file_matches_configured_extensions_case_insensitive() {
    let settings = LibrarySettings::default();
    assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
    assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
    assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
    assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
    assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
}

#[test]
fn scan_filters_non_audio_and_sorts_by_display_case_insensitive() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let settings = LibrarySettings {
        display_fields: vec![TrackDisplayField::Title],
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "A");
    assert_eq!(tracks[1].display, "b");
    assert!(tracks.iter().all(|t| t.duration.is_none()));
    assert_eq!(tracks[0].id, TrackId::from_path(&dir.path().join("A.ogg")));
}

#[test]
fn scan_skips_hidden_files_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        display_fields: vec![TrackDisplayField::Filename],
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].display, "visible");
}

#[test]
fn scan_respects_recursive_false_and_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    fs::write(d1.join("one.mp3"), b"not real").unwrap();
    fs::write(d2.join("two.mp3"), b"not real").unwrap();

    let flat = LibrarySettings {
        recursive: false,
        display_fields: vec![TrackDisplayField::Filename],
        ..LibrarySettings::default()
    };
    let names: Vec<String> = scan(dir.path(), &flat).into_iter().map(|t| t.display).collect();
    assert_eq!(names, vec!["root".to_string()]);

    // root is depth 0, so depth 2 reaches d1/* but not d1/d2/*
    let capped = LibrarySettings {
        max_depth: Some(2),
        display_fields: vec![TrackDisplayField::Filename],
        ..LibrarySettings::default()
    };
    let names: Vec<String> = scan(dir.path(), &capped).into_iter().map(|t| t.display).collect();
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"one".to_string()));
    assert!(!names.contains(&"two".to_string()));
}

#[test]
fn scan_attaches_sidecar_cover() {
    let dir = tempdir().unwrap();
    let album = dir.path().join("album");
    fs::create_dir_all(&album).unwrap();
    fs::write(album.join("song.mp3"), b"not real").unwrap();
    fs::write(album.join("folder.jpg"), b"img").unwrap();
    fs::write(dir.path().join("loose.mp3"), b"not real").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    let song = tracks.iter().find(|t| t.title == "song").unwrap();
    let loose = tracks.iter().find(|t| t.title == "loose").unwrap();
    assert_eq!(song.cover.as_deref(), Some(album.join("folder.jpg").as_path()));
    assert!(loose.cover.is_none());

    let names = vec!["missing.png".to_string(), "folder.jpg".to_string()];
    assert_eq!(
        find_cover(&album.join("song.mp3"), &names),
        Some(album.join("folder.jpg"))
    );
}
