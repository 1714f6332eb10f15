//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Sparkline, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus, Prompt};
use crate::audio::{LoopMode, Phase};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::equalizer::{BANDS, MAX_GAIN_DB};
use crate::library::describe;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected song"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next song"),
        ("x", "stop"),
        ("+/-", "volume"),
        ("/", "filter"),
        ("s", "shuffle"),
        ("r", "loop mode"),
        ("e", "equalizer"),
        ("v", "spectrum"),
        ("R", "rename"),
        ("d", "forget"),
        ("o", "reopen output"),
        ("q", "quit"),
    ])
});

const EQ_CONTROLS: &str = "[h/l] band | [j/k] gain | [P] preset | [e] back";

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "x", "+/-", "gg/G", "/", "s", "r", "e", "v",
        "R", "d", "o", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => total.map(format_mmss),
            TimeField::Remaining => total.map(|t| format!("-{}", format_mmss(t.saturating_sub(elapsed)))),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

fn loop_text(mode: LoopMode) -> &'static str {
    match mode {
        LoopMode::NoLoop => "PLAYBACK: No-loop",
        LoopMode::LoopAll => "PLAYBACK: Loop-around",
        LoopMode::LoopOne => "PLAYBACK: Repeat-one",
    }
}

fn phase_text(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Stopped",
        Phase::Loading => "Loading",
        Phase::Playing => "Playing",
        Phase::Paused => "Paused",
        Phase::Ended => "Ended",
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn status_text(app: &App, ui: &UiSettings) -> String {
    let now = &app.now;
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.follow_playback {
        " CURSOR: Follow".to_string()
    } else {
        " CURSOR: Free-roam".to_string()
    });
    parts.push(loop_text(now.loop_mode).to_string());

    let q = app.filter_query.trim();
    if app.filter_mode() || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    match &now.current {
        Some(track) => {
            let song = describe(
                track,
                &ui.now_playing_track_fields,
                &ui.now_playing_track_separator,
            );
            let total = (now.duration > 0.0).then(|| secs(now.duration));
            match now_playing_time_text(secs(now.current_time), total, ui) {
                Some(time) => parts.push(format!("Song: {song} [{time}]")),
                None => parts.push(format!("Song: {song}")),
            }
            parts.push(phase_text(now.phase).to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    parts.push(format!("Shuffle: {}", if now.shuffle { "ON" } else { "OFF" }));
    parts.push(format!("Vol: {:.0}%", now.volume * 100.0));
    if now.graph_active {
        parts.push(format!("EQ: {}", now.equalizer.preset));
    } else {
        parts.push("EQ: off".to_string());
    }
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {dir}"));
    }
    if let Some(err) = &now.last_error {
        parts.push(format!("Error: {err}"));
    }

    parts.join(" • ")
}

fn draw_track_list(frame: &mut Frame, app: &App, display: &[usize], area: Rect) {
    let q = app.filter_query.trim();
    let query_lower = (!q.is_empty() && app.uses_lower_titles()).then(|| q.to_ascii_lowercase());
    let playing_id = app.now.current.as_ref().map(|t| t.id);

    // Only build ListItems for the visible window, centered on the selection.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let track = &app.tracks[i];
            let title = &track.display;
            let marker = if Some(track.id) == playing_id { "♪ " } else { "  " };

            let positions = if q.is_empty() {
                None
            } else {
                match query_lower.as_deref() {
                    Some(ql) => app.fuzzy_match_positions_for_track_lower(i, ql),
                    None => App::fuzzy_match_positions(title, q),
                }
            };
            let rendered = match positions {
                Some(positions) => {
                    let mut rendered = String::new();
                    let mut pos_iter = positions.into_iter();
                    let mut next_pos = pos_iter.next();
                    for (ci, ch) in title.chars().enumerate() {
                        if next_pos == Some(ci) {
                            rendered.extend(ch.to_uppercase());
                            next_pos = pos_iter.next();
                        } else {
                            rendered.push(ch);
                        }
                    }
                    rendered
                }
                None => title.clone(),
            };
            ListItem::new(format!("{marker}{rendered}"))
        })
        .collect();

    let border_style = if app.focus == Focus::Library {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let list = List::new(visible_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(" tracks ({total}) ")),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// One row per band: label, gain and a bar scaled to the gain range.
fn draw_equalizer(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Equalizer;
    let half_width = 8usize;

    let mut lines: Vec<Line> = BANDS
        .iter()
        .enumerate()
        .map(|(i, band)| {
            let gain = app.equalizer.gains[i];
            let cells = ((gain.abs() / MAX_GAIN_DB) * half_width as f32).round() as usize;
            let cells = cells.min(half_width);
            let (left, right) = if gain < 0.0 {
                (
                    format!("{}{}", " ".repeat(half_width - cells), "█".repeat(cells)),
                    " ".repeat(half_width),
                )
            } else {
                (
                    " ".repeat(half_width),
                    format!("{}{}", "█".repeat(cells), " ".repeat(half_width - cells)),
                )
            };
            let text = format!("{:>6} {:+5.1} dB {left}|{right}", band.label, gain);
            let style = if focused && i == app.eq_band {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(text, style))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(format!(" preset: {}", app.equalizer.preset)));
    if !app.now.graph_active {
        lines.push(Line::from(" (graph unavailable)").italic());
    }

    let border_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" equalizer "),
    );
    frame.render_widget(panel, area);
}

fn draw_spectrum(frame: &mut Frame, spectrum: Option<&[u8]>, area: Rect) {
    let data: Vec<u64> = spectrum
        .map(|bins| bins.iter().map(|&b| u64::from(b)).collect())
        .unwrap_or_default();
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(" spectrum "))
        .data(&data)
        .max(255);
    frame.render_widget(sparkline, area);
}

fn draw_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let Some(Prompt::Rename { buffer, .. }) = &app.prompt else {
        return;
    };
    let popup = centered_rect_sized(60, 3, area);
    frame.render_widget(Clear, popup);
    let input = Paragraph::new(format!("{buffer}▏")).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" rename (enter saves, esc cancels) "),
    );
    frame.render_widget(input, popup);
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    spectrum: Option<&[u8]>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let spectrum_height = if app.show_spectrum { 8 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(spectrum_height),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" nova ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(38)])
        .split(chunks[2]);
    draw_track_list(frame, app, display, middle[0]);
    draw_equalizer(frame, app, middle[1]);
    draw_prompt(frame, app, chunks[2]);

    if app.show_spectrum {
        draw_spectrum(frame, spectrum, chunks[3]);
    }

    let footer_text = if app.focus == Focus::Equalizer {
        EQ_CONTROLS.to_string()
    } else {
        controls_text(controls_settings.scrub_seconds)
    };
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
