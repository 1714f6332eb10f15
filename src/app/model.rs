//! Application model types: `App`, `Focus` and `Prompt`.
//!
//! The `App` struct holds the library, the selection, the filter and the
//! latest playback snapshot used by the UI and runtime.

use crate::audio::{AudioCmd, PlaybackHandle, PlaybackInfo};
use crate::equalizer::{BAND_COUNT, EqPreset, EqualizerSettings};
use crate::library::{Track, TrackId};

/// Gain step for one `j`/`k` press in the equalizer panel (dB).
pub const EQ_STEP_DB: f32 = 1.0;

/// Which panel receives navigation keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Library,
    Equalizer,
}

/// A line of text input owned by the bottom prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    Filter,
    Rename { id: TrackId, buffer: String },
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub playback_handle: Option<PlaybackHandle>,
    /// Latest engine snapshot, refreshed once per frame.
    pub now: PlaybackInfo,

    lower_titles: Option<Vec<String>>,

    pub follow_playback: bool,
    pending_follow: Option<TrackId>,

    pub prompt: Option<Prompt>,
    pub filter_query: String,

    pub focus: Focus,
    pub eq_band: usize,
    pub equalizer: EqualizerSettings,
    pub show_spectrum: bool,

    pub current_dir: Option<String>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut app = Self {
            tracks,
            selected: 0,
            playback_handle: None,
            now: PlaybackInfo::default(),

            lower_titles: None,

            follow_playback: true,
            pending_follow: None,

            prompt: None,
            filter_query: String::new(),

            focus: Focus::Library,
            eq_band: 0,
            equalizer: EqualizerSettings::default(),
            show_spectrum: true,

            current_dir: None,
        };
        app.refresh_lower_titles();
        app
    }

    // Large libraries keep lowercase titles around so fuzzy filtering does
    // not lowercase every title on every keystroke.
    fn refresh_lower_titles(&mut self) {
        self.lower_titles = (self.tracks.len() > 100).then(|| {
            self.tracks
                .iter()
                .map(|t| t.display.to_ascii_lowercase())
                .collect()
        });
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    /// Disable follow-playback and forget any pending follow target.
    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow = None;
    }

    /// Follow `id` once the engine reports it as current.
    pub fn follow_when_current(&mut self, id: TrackId) {
        self.follow_playback = true;
        self.pending_follow = Some(id);
    }

    /// Command that starts the selected track, with the visible list as the
    /// engine's new queue. Filter edits reach the engine only this way.
    pub fn play_selected(&mut self) -> Option<AudioCmd> {
        if !self.display_indices().contains(&self.selected) {
            return None;
        }
        let track = self.selected_track()?.clone();
        self.follow_when_current(track.id);
        Some(AudioCmd::PlayTrack {
            track,
            queue: Some(self.visible_queue()),
        })
    }

    pub fn set_playback_handle(&mut self, h: PlaybackHandle) {
        self.playback_handle = Some(h);
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn filter_mode(&self) -> bool {
        matches!(self.prompt, Some(Prompt::Filter))
    }

    /// Pull the latest snapshot from the engine and move the cursor along
    /// with playback when following.
    pub fn sync_playback(&mut self) {
        let Some(info) = self
            .playback_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|info| info.clone()))
        else {
            return;
        };
        self.apply_snapshot(info);
    }

    pub fn apply_snapshot(&mut self, info: PlaybackInfo) {
        let current = info.current.as_ref().map(|t| t.id);
        self.now = info;

        let Some(id) = current else {
            return;
        };
        if !self.follow_playback || self.prompt.is_some() {
            return;
        }
        match self.pending_follow {
            Some(pending) if pending != id => return,
            Some(_) => self.pending_follow = None,
            None => {}
        }
        if let Some(idx) = self.index_of(id) {
            if self.selected != idx {
                self.set_selected(idx);
            }
        }
    }

    pub fn index_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Whether the selection is the track the engine is playing right now.
    pub fn selected_is_playing(&self) -> bool {
        self.now.playing
            && self
                .now
                .current
                .as_ref()
                .zip(self.selected_track())
                .is_some_and(|(cur, sel)| cur.id == sel.id)
    }

    /// Track indices in display order, after filtering.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = 0..self.tracks.len();

        let query = self.filter_query.trim();
        if query.is_empty() {
            return base.collect();
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                base.filter(|&i| {
                    Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some()
                })
                .collect()
            }
            None => base
                .filter(|&i| Self::fuzzy_match_positions(&self.tracks[i].display, query).is_some())
                .collect(),
        }
    }

    /// The visible list as a play queue.
    pub fn visible_queue(&self) -> Vec<Track> {
        self.display_indices()
            .into_iter()
            .map(|i| self.tracks[i].clone())
            .collect()
    }

    pub fn uses_lower_titles(&self) -> bool {
        self.lower_titles.is_some()
    }

    /// Fuzzy-match `query_lower` against a specific track by index.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        track_index: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                Self::fuzzy_match_positions_lower(&lower_titles[track_index], query_lower)
            }
            None => Self::fuzzy_match_positions(&self.tracks[track_index].display, query_lower),
        }
    }

    /// Next visible index after `current`, wrapping around.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping around.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
        }
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    pub fn enter_filter_mode(&mut self) {
        self.prompt = Some(Prompt::Filter);
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    /// Leave the filter prompt, keeping the query.
    pub fn exit_filter_mode(&mut self) {
        if self.filter_mode() {
            self.prompt = None;
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        if self.filter_mode() {
            self.prompt = None;
        }
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Move selection to the first visible track if it got filtered out.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    /// Start editing the selected track's title.
    pub fn begin_rename(&mut self) -> bool {
        let Some(track) = self.selected_track() else {
            return false;
        };
        self.prompt = Some(Prompt::Rename {
            id: track.id,
            buffer: track.title.clone(),
        });
        true
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if self.filter_mode() {
            self.push_filter_char(c);
        } else if let Some(Prompt::Rename { buffer, .. }) = &mut self.prompt {
            buffer.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if self.filter_mode() {
            self.pop_filter_char();
        } else if let Some(Prompt::Rename { buffer, .. }) = &mut self.prompt {
            buffer.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        if matches!(self.prompt, Some(Prompt::Rename { .. })) {
            self.prompt = None;
        }
    }

    /// Apply the rename prompt to the library. Returns what the engine has to
    /// be told, or `None` when nothing changed.
    pub fn commit_rename(&mut self) -> Option<(TrackId, String)> {
        let Some(Prompt::Rename { id, buffer }) = self.prompt.take() else {
            return None;
        };
        let title = buffer.trim().to_string();
        let idx = self.index_of(id)?;
        if title.is_empty() || self.tracks[idx].title == title {
            return None;
        }
        self.tracks[idx].rename(&title);
        self.refresh_lower_titles();
        Some((id, title))
    }

    /// Drop the selected track from the library.
    pub fn forget_selected(&mut self) -> Option<TrackId> {
        if self.selected >= self.tracks.len() {
            return None;
        }
        let next = self.next_in_view_from(self.selected);
        let removed = self.tracks.remove(self.selected);

        self.refresh_lower_titles();
        self.selected = match next {
            Some(n) if n > self.selected => n - 1,
            Some(n) if n < self.selected => n,
            _ => 0,
        };
        self.ensure_selected_visible();
        Some(removed.id)
    }

    pub fn toggle_equalizer_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Library => Focus::Equalizer,
            Focus::Equalizer => Focus::Library,
        };
    }

    pub fn next_band(&mut self) {
        self.eq_band = (self.eq_band + 1) % BAND_COUNT;
    }

    pub fn prev_band(&mut self) {
        self.eq_band = (self.eq_band + BAND_COUNT - 1) % BAND_COUNT;
    }

    /// Raise or lower the focused band. Returns the settings to push to the
    /// engine when anything changed.
    pub fn nudge_band(&mut self, steps: i8) -> Option<EqualizerSettings> {
        let before = self.equalizer.clone();
        self.equalizer
            .nudge_gain(self.eq_band, f32::from(steps) * EQ_STEP_DB);
        (self.equalizer != before).then(|| self.equalizer.clone())
    }

    pub fn cycle_preset(&mut self) -> EqualizerSettings {
        let next = match self.equalizer.preset.next() {
            // Custom is reached by editing a band, not by cycling.
            EqPreset::Custom => EqPreset::Custom.next(),
            p => p,
        };
        self.equalizer.set_preset(next);
        self.equalizer.clone()
    }

    pub fn toggle_spectrum(&mut self) {
        self.show_spectrum = !self.show_spectrum;
    }
}
