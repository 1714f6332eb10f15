use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Empty fields are skipped; falls back to `title` when nothing was produced.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let non_empty = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            // "display" inside the field list means artist then title
            TrackDisplayField::Display => {
                parts.extend(non_empty(artist));
                parts.extend(non_empty(Some(title)));
            }
            TrackDisplayField::Title => parts.extend(non_empty(Some(title))),
            TrackDisplayField::Artist => parts.extend(non_empty(artist)),
            TrackDisplayField::Album => parts.extend(non_empty(album)),
            TrackDisplayField::Filename => {
                parts.extend(non_empty(path.file_stem().and_then(|s| s.to_str())));
            }
            TrackDisplayField::Path => parts.push(path.display().to_string()),
        }
    }

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}

/// Status-line text for a track. `Display` here means the scanner's string.
pub fn describe(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    if fields.is_empty() || fields == [TrackDisplayField::Display] {
        return track.display.clone();
    }
    let fields: Vec<TrackDisplayField> = fields
        .iter()
        .copied()
        .filter(|f| *f != TrackDisplayField::Display)
        .collect();
    display_from_fields(
        &track.source,
        &track.title,
        track.artist.as_deref(),
        track.album.as_deref(),
        &fields,
        sep,
    )
}
