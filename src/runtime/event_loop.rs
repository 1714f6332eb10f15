use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Focus, Prompt};
use crate::audio::{AudioCmd, AudioPlayer};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, UI drawing, sync with the audio
/// thread and MPRIS. Returns `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Covers changes that did not start here: media keys, auto-advance, errors.
        app.sync_playback();
        update_mpris(mpris, app);

        let spectrum = if app.show_spectrum {
            audio_player.spectrum()
        } else {
            None
        };
        let display = app.display_indices();
        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                &display,
                spectrum.as_deref(),
                &settings.ui,
                &settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, audio_player)? {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, audio_player, control_tx, state)? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Start the selected track with the visible list as its queue.
fn play_selected(app: &mut App, audio_player: &AudioPlayer) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(cmd) = app.play_selected() {
        audio_player.send(cmd)?;
    }
    Ok(())
}

fn follow_unless_prompting(app: &mut App) {
    if app.prompt.is_none() {
        app.follow_playback_on();
    }
}

fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
) -> Result<bool, Box<dyn std::error::Error>> {
    debug!(?cmd, "control command");
    let has_current = app.now.current.is_some();
    match cmd {
        ControlCmd::Quit => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return Ok(true);
        }
        ControlCmd::Play if !has_current => play_selected(app, audio_player)?,
        ControlCmd::Play => {
            follow_unless_prompting(app);
            audio_player.send(AudioCmd::Play)?;
        }
        ControlCmd::Pause => audio_player.send(AudioCmd::Pause)?,
        ControlCmd::PlayPause if !has_current => play_selected(app, audio_player)?,
        ControlCmd::PlayPause => {
            follow_unless_prompting(app);
            audio_player.send(AudioCmd::TogglePause)?;
        }
        ControlCmd::Stop => audio_player.send(AudioCmd::Stop)?,
        ControlCmd::Next => {
            follow_unless_prompting(app);
            audio_player.send(AudioCmd::Next)?;
        }
        ControlCmd::Prev => {
            follow_unless_prompting(app);
            audio_player.send(AudioCmd::Prev)?;
        }
        ControlCmd::SetVolume(v) => audio_player.send(AudioCmd::SetVolume(v))?,
        ControlCmd::SetShuffle(on) => audio_player.send(AudioCmd::SetShuffle(on))?,
        ControlCmd::SetLoopMode(mode) => audio_player.send(AudioCmd::SetLoopMode(mode))?,
    }

    Ok(false)
}

fn handle_prompt_key(
    key: KeyEvent,
    app: &mut App,
    audio_player: &AudioPlayer,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let renaming = matches!(app.prompt, Some(Prompt::Rename { .. }));

    match key.code {
        KeyCode::Esc if renaming => app.cancel_rename(),
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_prompt_char(),
        KeyCode::Enter if renaming => {
            if let Some((id, title)) = app.commit_rename() {
                audio_player.send(AudioCmd::RenameTrack { id, title })?;
            }
        }
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return Ok(());
            }
            app.exit_filter_mode();
            play_selected(app, audio_player)?;
        }
        KeyCode::Char('j' | 'n') if ctrl && !renaming => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k' | 'p') if ctrl && !renaming => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) if !c.is_control() && !ctrl => app.push_prompt_char(c),
        _ => {}
    }
    Ok(())
}

/// Keys owned by the equalizer panel. Returns `false` for keys it leaves to
/// the global bindings.
fn handle_equalizer_key(
    key: KeyEvent,
    app: &mut App,
    audio_player: &AudioPlayer,
) -> Result<bool, Box<dyn std::error::Error>> {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => app.prev_band(),
        KeyCode::Char('l') | KeyCode::Right => app.next_band(),
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(eq) = app.nudge_band(1) {
                audio_player.send(AudioCmd::SetEqualizer(eq))?;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(eq) = app.nudge_band(-1) {
                audio_player.send(AudioCmd::SetEqualizer(eq))?;
            }
        }
        KeyCode::Char('P') => {
            let eq = app.cycle_preset();
            audio_player.send(AudioCmd::SetEqualizer(eq))?;
        }
        KeyCode::Char('e') | KeyCode::Esc => app.toggle_equalizer_focus(),
        _ => return Ok(false),
    }
    Ok(true)
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<bool, Box<dyn std::error::Error>> {
    if app.prompt.is_some() {
        state.pending_gg = false;
        handle_prompt_key(key, app, audio_player)?;
        return Ok(false);
    }

    if app.focus == Focus::Equalizer && handle_equalizer_key(key, app, audio_player)? {
        state.pending_gg = false;
        return Ok(false);
    }

    let gg_prefix = key.code == KeyCode::Char('g');
    if !gg_prefix {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return Ok(true);
        }
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('s') => audio_player.send(AudioCmd::ToggleShuffle)?,
        KeyCode::Char('r') => audio_player.send(AudioCmd::ToggleLoop)?,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                if let Some(&first) = app.display_indices().first() {
                    app.set_selected(first);
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            if let Some(&last) = app.display_indices().last() {
                app.set_selected(last);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => {
            if !app.selected_is_playing() {
                play_selected(app, audio_player)?;
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('x') => {
            let _ = control_tx.send(ControlCmd::Stop);
        }
        KeyCode::Char('L') => {
            let secs = settings.controls.scrub_seconds.min(i32::MAX as u64) as i32;
            audio_player.send(AudioCmd::SeekBy(secs))?;
        }
        KeyCode::Char('H') => {
            let secs = settings.controls.scrub_seconds.min(i32::MAX as u64) as i32;
            audio_player.send(AudioCmd::SeekBy(-secs))?;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = (app.now.volume + settings.controls.volume_step).min(1.0);
            audio_player.send(AudioCmd::SetVolume(v))?;
        }
        KeyCode::Char('-') => {
            let v = (app.now.volume - settings.controls.volume_step).max(0.0);
            audio_player.send(AudioCmd::SetVolume(v))?;
        }
        KeyCode::Char('d') => {
            if let Some(id) = app.forget_selected() {
                audio_player.send(AudioCmd::ForgetTrack(id))?;
            }
        }
        KeyCode::Char('R') => {
            app.begin_rename();
        }
        KeyCode::Char('e') => app.toggle_equalizer_focus(),
        KeyCode::Char('v') => app.toggle_spectrum(),
        KeyCode::Char('o') => audio_player.send(AudioCmd::ResetOutput)?,
        _ => {}
    }

    Ok(false)
}
