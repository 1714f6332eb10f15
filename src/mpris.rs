//! MPRIS (`org.mpris.MediaPlayer2`) service on the session bus.
//!
//! The runtime pushes engine snapshots in with [`MprisHandle::update`]; the
//! bus thread signals `PropertiesChanged` when they differ from what it last
//! published. Remote actions come back as [`ControlCmd`]s and are executed by
//! the runtime against whatever is current at that moment.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::audio::{LoopMode, Phase, PlaybackInfo};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.nova";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SetVolume(f32),
    SetShuffle(bool),
    SetLoopMode(LoopMode),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    fn from_info(info: &PlaybackInfo) -> Self {
        if info.current.is_none() {
            return Self::Stopped;
        }
        match info.phase {
            Phase::Idle => Self::Stopped,
            Phase::Loading | Phase::Playing => Self::Playing,
            Phase::Paused | Phase::Ended => Self::Paused,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

fn loop_status(mode: LoopMode) -> &'static str {
    match mode {
        LoopMode::NoLoop => "None",
        LoopMode::LoopOne => "Track",
        LoopMode::LoopAll => "Playlist",
    }
}

fn parse_loop_status(value: &str) -> Option<LoopMode> {
    match value {
        "None" => Some(LoopMode::NoLoop),
        "Track" => Some(LoopMode::LoopOne),
        "Playlist" => Some(LoopMode::LoopAll),
        _ => None,
    }
}

fn file_url(path: &std::path::Path) -> String {
    format!("file://{}", path.display())
}

/// What the bus currently exposes.
#[derive(Clone, Debug, Default, PartialEq)]
struct SharedState {
    playback: PlaybackStatus,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    loop_mode: LoopMode,
    shuffle: bool,
    volume: f64,
}

impl SharedState {
    fn from_info(info: &PlaybackInfo) -> Self {
        let mut state = Self {
            playback: PlaybackStatus::from_info(info),
            loop_mode: info.loop_mode,
            shuffle: info.shuffle,
            volume: f64::from(info.volume),
            ..Self::default()
        };
        let Some(track) = &info.current else {
            return state;
        };

        state.track_id = OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", track.id)).ok();
        state.title = Some(track.title.clone());
        state.artist = track.artist.iter().cloned().collect();
        state.album = track.album.clone();
        state.url = track.has_source().then(|| file_url(&track.source));
        state.art_url = track.cover.as_deref().map(file_url);

        let length = if info.duration > 0.0 {
            Some(info.duration * 1_000_000.0)
        } else {
            track.duration.map(|d| d.as_micros() as f64)
        };
        state.length_micros = length.map(|us| us as i64);
        state
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Publish a new engine snapshot. Returns whether anything visible changed.
    pub fn update(&self, info: &PlaybackInfo) -> bool {
        let next = SharedState::from_info(info);
        let Ok(mut s) = self.state.lock() else {
            return false;
        };
        if *s == next {
            return false;
        }
        *s = next;
        drop(s);
        let _ = self.notify.send(());
        true
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "nova"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T) -> Option<T> {
        self.state.lock().ok().map(|s| f(&s))
    }

    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("mpris action dropped, runtime is gone");
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.read(|s| s.playback.as_str()).unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        self.read(|s| loop_status(s.loop_mode)).unwrap_or("None")
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match parse_loop_status(&value) {
            Some(mode) => self.send(ControlCmd::SetLoopMode(mode)),
            None => warn!(%value, "ignoring unknown mpris loop status"),
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(|s| s.volume).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        if value.is_finite() {
            self.send(ControlCmd::SetVolume(value.clamp(0.0, 1.0) as f32));
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Some(s) = self.read(SharedState::clone) else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };
        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(ObjectPath::clone(id)));
        }
        if let Some(title) = s.title {
            put("xesam:title", Value::from(title));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist));
        }
        if let Some(album) = s.album {
            put("xesam:album", Value::from(album));
        }
        if let Some(url) = s.url {
            put("xesam:url", Value::from(url));
        }
        if let Some(art) = s.art_url {
            put("mpris:artUrl", Value::from(art));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        map
    }
}

async fn emit_changes(player: &InterfaceRef<PlayerIface>) -> zbus::Result<()> {
    let emitter = player.signal_emitter();
    let iface = player.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;
    iface.volume_changed(emitter).await?;
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    debug!(name = BUS_NAME, "mpris service registered");

    loop {
        Timer::after(Duration::from_millis(100)).await;

        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if changed {
            if let Err(err) = emit_changes(&player).await {
                debug!(%err, "could not signal mpris property changes");
            }
        }
    }
}

/// Start the MPRIS service on its own thread. Failures to reach the bus are
/// logged; the returned handle keeps working either way.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("nova-mpris".into())
        .spawn(move || {
            if let Err(err) = block_on(serve(tx, state_for_thread, notify_rx)) {
                warn!(%err, "mpris unavailable");
            }
        });
    if let Err(err) = spawned {
        warn!(%err, "could not start mpris thread");
    }

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
