use super::*;

#[test]
fn play_tickets_are_increasing() {
    let mut events = SinkEvents::default();
    assert_eq!(events.resolve_play(Ok(())), PlayRequest(1));
    assert_eq!(events.resolve_play(Ok(())), PlayRequest(2));
}

#[test]
fn replacing_the_source_aborts_tickets_and_drops_stale_events() {
    let mut events = SinkEvents::default();
    events.push(ResourceEvent::LoadedMetadata { duration: 3.0 });
    let first = events.resolve_play(Ok(()));
    events.push(ResourceEvent::TimeUpdate(1.0));

    events.abort_pending();

    assert_eq!(
        events.pop_queued(),
        Some(ResourceEvent::PlayResolved {
            request: first,
            result: Err(PlayFailure::Aborted),
        })
    );
    assert_eq!(events.pop_queued(), None);
}

#[test]
fn queued_events_come_before_sink_state() {
    let mut events = SinkEvents::default();
    let now = Instant::now();
    let err = MediaError::new(MediaErrorKind::Decode, "bad frame");
    events.push(ResourceEvent::Error(err.clone()));

    assert_eq!(
        events.poll(SinkStatus::Drained, now, || 0.0),
        Some(ResourceEvent::Error(err))
    );
    assert_eq!(
        events.poll(SinkStatus::Drained, now, || 0.0),
        Some(ResourceEvent::Ended)
    );
}

#[test]
fn ended_is_reported_once_per_sink() {
    let mut events = SinkEvents::default();
    let now = Instant::now();

    assert_eq!(
        events.poll(SinkStatus::Drained, now, || 0.0),
        Some(ResourceEvent::Ended)
    );
    assert_eq!(events.poll(SinkStatus::Drained, now, || 0.0), None);

    // A rebuilt sink may end again.
    events.restart_progress();
    assert_eq!(
        events.poll(SinkStatus::Drained, now, || 0.0),
        Some(ResourceEvent::Ended)
    );
}

#[test]
fn time_updates_are_throttled_while_running() {
    let mut events = SinkEvents::default();
    let start = Instant::now();

    assert_eq!(
        events.poll(SinkStatus::Running, start, || 1.5),
        Some(ResourceEvent::TimeUpdate(1.5))
    );
    assert_eq!(
        events.poll(SinkStatus::Running, start + Duration::from_millis(100), || 1.6),
        None
    );
    assert_eq!(
        events.poll(SinkStatus::Running, start + TIME_UPDATE_EVERY, || 1.75),
        Some(ResourceEvent::TimeUpdate(1.75))
    );
    assert_eq!(
        events.poll(SinkStatus::Paused, start + Duration::from_secs(5), || 9.0),
        None
    );
}

#[test]
fn drained_or_finished_sink_needs_reload() {
    let mut events = SinkEvents::default();
    assert!(!events.needs_reload(None));
    assert!(!events.needs_reload(Some(SinkStatus::Running)));
    assert!(events.needs_reload(Some(SinkStatus::Drained)));

    events.poll(SinkStatus::Drained, Instant::now(), || 0.0);
    assert!(events.needs_reload(Some(SinkStatus::Paused)));

    events.restart_progress();
    assert!(!events.needs_reload(Some(SinkStatus::Paused)));
}

#[test]
fn open_failures_map_to_media_error_kinds() {
    let path = Path::new("/music/missing.flac");

    let missing = open_error(path, &io::Error::from(io::ErrorKind::NotFound));
    assert_eq!(missing.kind, MediaErrorKind::Network);
    assert!(missing.message.contains("missing.flac"));

    let interrupted = open_error(path, &io::Error::from(io::ErrorKind::Interrupted));
    assert_eq!(interrupted.kind, MediaErrorKind::Aborted);

    let unknown = decode_error(path, &DecoderError::UnrecognizedFormat);
    assert_eq!(unknown.kind, MediaErrorKind::SourceNotSupported);
}

#[test]
fn seek_target_starts_over_for_unusable_input() {
    assert_eq!(seek_target(1.5), Duration::from_millis(1500));
    assert_eq!(seek_target(-3.0), Duration::ZERO);
    assert_eq!(seek_target(f64::NAN), Duration::ZERO);
    assert_eq!(seek_target(f64::INFINITY), Duration::ZERO);
}
