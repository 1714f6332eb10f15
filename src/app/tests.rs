use super::*;
use crate::audio::{AudioCmd, PlaybackInfo};
use crate::equalizer::EqPreset;
use crate::library::Track;

fn t(title: &str) -> Track {
    Track::new(format!("/music/{title}.mp3"), title)
}

fn playing(track: &Track) -> PlaybackInfo {
    PlaybackInfo {
        current: Some(track.clone()),
        playing: true,
        ..PlaybackInfo::default()
    }
}

#[test]
fn fuzzy_match_simple() {
    let title = "Hello World";
    assert!(App::fuzzy_match_positions(title, "hw").is_some());
    assert!(App::fuzzy_match_positions(title, "ello").is_some());
    assert!(App::fuzzy_match_positions(title, "xyz").is_none());
    assert_eq!(App::fuzzy_match_positions(title, "HW"), Some(vec![0, 6]));
}

#[test]
fn display_indices_respects_filter_query() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma"), t("Delta")]);
    app.enter_filter_mode();
    for c in "et".chars() {
        app.push_filter_char(c);
    }
    assert_eq!(app.display_indices(), vec![1, 3]);
}

#[test]
fn display_indices_uses_fuzzy_not_substring_only() {
    let mut app = App::new(vec![t("Metallica - Blackened"), t("Black Sabbath - Paranoid")]);
    app.filter_query = "mtbk".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn large_libraries_filter_through_lowercase_cache() {
    let tracks: Vec<Track> = (0..150).map(|i| t(&format!("Song {i:03}"))).collect();
    let mut app = App::new(tracks);
    assert!(app.uses_lower_titles());

    app.filter_query = "SONG 149".into();
    assert_eq!(app.display_indices(), vec![149]);
    assert_eq!(
        app.fuzzy_match_positions_for_track_lower(149, "song 149"),
        Some(vec![0, 1, 2, 3, 4, 5, 6, 7])
    );
}

#[test]
fn trimming_filter_query_affects_matching() {
    let mut app = App::new(vec![t("Black Sabbath - Paranoid")]);
    app.filter_query = "Black ".into();
    assert_eq!(app.display_indices(), vec![0]);

    app.filter_query = "   ".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn next_prev_in_view_helpers_work() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.filter_query = "et".into();

    assert_eq!(app.next_in_view_from(0), Some(1));
    assert_eq!(app.prev_in_view_from(0), Some(1));
    assert_eq!(app.next_in_view_from(1), Some(1));
    assert_eq!(app.prev_in_view_from(1), Some(1));
}

#[test]
fn visible_queue_is_the_filtered_list() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.filter_query = "ga".into();
    let titles: Vec<String> = app.visible_queue().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Gamma".to_string()]);
}

#[test]
fn filtered_queue_reaches_the_engine_only_when_playing() {
    let tracks = vec![t("Alpha"), t("Bravo"), t("Charlie")];
    let mut app = App::new(tracks.clone());

    match app.play_selected() {
        Some(AudioCmd::PlayTrack { track, queue }) => {
            assert_eq!(track.title, "Alpha");
            assert_eq!(queue, Some(tracks.clone()));
        }
        other => panic!("unexpected command: {other:?}"),
    }
    app.apply_snapshot(playing(&tracks[0]));

    // Typing a filter only changes what is shown.
    app.enter_filter_mode();
    for c in "brav".chars() {
        app.push_filter_char(c);
    }
    assert_eq!(app.display_indices(), vec![1]);
    assert_eq!(app.now.current.as_ref().map(|t| t.title.as_str()), Some("Alpha"));

    app.exit_filter_mode();
    match app.play_selected() {
        Some(AudioCmd::PlayTrack { track, queue }) => {
            assert_eq!(track.title, "Bravo");
            assert_eq!(queue, Some(vec![tracks[1].clone()]));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn play_selected_needs_a_visible_track() {
    assert!(App::new(Vec::new()).play_selected().is_none());

    let mut app = App::new(vec![t("Alpha"), t("Bravo")]);
    app.enter_filter_mode();
    for c in "zzz".chars() {
        app.push_filter_char(c);
    }
    assert!(app.play_selected().is_none());
}

#[test]
fn snapshot_moves_cursor_when_following() {
    let tracks = vec![t("A"), t("B"), t("C")];
    let mut app = App::new(tracks.clone());

    app.apply_snapshot(playing(&tracks[2]));
    assert_eq!(app.selected, 2);

    app.follow_playback_off();
    app.apply_snapshot(playing(&tracks[1]));
    assert_eq!(app.selected, 2);
}

#[test]
fn pending_follow_waits_for_the_requested_track() {
    let tracks = vec![t("A"), t("B"), t("C")];
    let mut app = App::new(tracks.clone());
    app.set_selected(1);
    app.follow_when_current(tracks[1].id);

    // Engine still reports the previous track.
    app.apply_snapshot(playing(&tracks[0]));
    assert_eq!(app.selected, 1);

    app.apply_snapshot(playing(&tracks[1]));
    assert_eq!(app.selected, 1);
    assert!(app.selected_is_playing());

    app.apply_snapshot(playing(&tracks[2]));
    assert_eq!(app.selected, 2);
}

#[test]
fn rename_updates_library_and_reports_change() {
    let mut app = App::new(vec![Track {
        artist: Some("Band".into()),
        display: "Band - Old".into(),
        ..t("Old")
    }]);

    assert!(app.begin_rename());
    for _ in 0.."Old".len() {
        app.pop_prompt_char();
    }
    for c in "New".chars() {
        app.push_prompt_char(c);
    }
    let (id, title) = app.commit_rename().unwrap();
    assert_eq!(id, app.tracks[0].id);
    assert_eq!(title, "New");
    assert_eq!(app.tracks[0].display, "Band - New");
    assert!(app.prompt.is_none());
}

#[test]
fn rename_to_same_or_blank_title_is_dropped() {
    let mut app = App::new(vec![t("Same")]);
    assert!(app.begin_rename());
    assert_eq!(app.commit_rename(), None);

    assert!(app.begin_rename());
    if let Some(Prompt::Rename { buffer, .. }) = &mut app.prompt {
        *buffer = "   ".into();
    }
    assert_eq!(app.commit_rename(), None);
    assert_eq!(app.tracks[0].title, "Same");
}

#[test]
fn forget_selected_removes_track_and_keeps_cursor_nearby() {
    let tracks = vec![t("A"), t("B"), t("C")];
    let mut app = App::new(tracks.clone());
    app.set_selected(1);

    assert_eq!(app.forget_selected(), Some(tracks[1].id));
    assert_eq!(app.tracks.len(), 2);
    assert_eq!(app.selected_track().map(|t| t.title.as_str()), Some("C"));

    app.set_selected(1);
    assert_eq!(app.forget_selected(), Some(tracks[2].id));
    assert_eq!(app.selected_track().map(|t| t.title.as_str()), Some("A"));
}

#[test]
fn equalizer_panel_edits_focused_band() {
    let mut app = App::new(vec![t("A")]);
    app.toggle_equalizer_focus();
    assert_eq!(app.focus, Focus::Equalizer);

    app.prev_band();
    assert_eq!(app.eq_band, 4);
    app.next_band();
    app.next_band();
    assert_eq!(app.eq_band, 1);

    let eq = app.nudge_band(3).unwrap();
    assert_eq!(eq.preset, EqPreset::Custom);
    assert_eq!(eq.gains[1], 3.0);

    // Already at the ceiling: nothing to send.
    app.equalizer.set_gain(1, 12.0);
    assert!(app.nudge_band(1).is_none());
}

#[test]
fn cycling_presets_skips_custom() {
    let mut app = App::new(vec![t("A")]);
    app.equalizer.set_preset(EqPreset::Pop);
    let eq = app.cycle_preset();
    assert_eq!(eq.preset, EqPreset::Flat);
    assert_eq!(eq.gains, [0.0; 5]);

    let eq = app.cycle_preset();
    assert_eq!(eq.preset, EqPreset::BassBoost);
}
