use crate::error::FileFormatError;
use crate::model::song::*;
use log::{debug, info, warn};
use midly::{MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> Result<Timeline, FileFormatError> {
    let bytes = fs::read(path.as_ref()).map_err(|source| FileFormatError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let timeline = import_midi_bytes(&bytes)?;
    info!(
        "Read {} chord groups ({} notes) from MIDI file '{}'..!",
        timeline.len(),
        timeline.note_count(),
        path.as_ref().display()
    );

    Ok(timeline)
}

pub fn import_midi_bytes(bytes: &[u8]) -> Result<Timeline, FileFormatError> {
    let tracks = read_tracks(bytes)?;
    Ok(extract(&tracks))
}

/// Flattens every track of a Standard MIDI File into note on/off events at absolute ticks.
/// Meta, sysex and non-note channel messages are skipped; channels are not distinguished.
pub fn read_tracks(bytes: &[u8]) -> Result<Vec<Vec<RawEvent>>, FileFormatError> {
    let smf = Smf::parse(bytes).map_err(|e| FileFormatError::Parse(format!("{:?}", e)))?;

    match smf.header.timing {
        Timing::Metrical(t) => debug!("Ticks per quarter note: {}", t.as_int()),
        Timing::Timecode(fps, subframe) => debug!(
            "SMPTE timing ({:?} fps, {} subframes), reading ticks as-is..!",
            fps, subframe
        ),
    }
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            let mut abs_tick: u64 = 0;
            let mut events: Vec<RawEvent> = Vec::new();

            for event in track.iter() {
                abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

                if let TrackEventKind::Midi { message, .. } = &event.kind {
                    match message {
                        MidiMessage::NoteOn { key, vel } => {
                            events.push(RawEvent::note_on(key.as_int(), vel.as_int(), abs_tick));
                        }
                        MidiMessage::NoteOff { key, .. } => {
                            events.push(RawEvent::note_off(key.as_int(), abs_tick));
                        }
                        _ => {}
                    }
                }
            }

            events
        })
        .collect();

    Ok(tracks)
}

/// Pairs note on/off events into notes and groups them into a timeline.
///
/// Within a track, a NoteOn for a pitch that is already sounding replaces the open note
/// (the earlier one is never emitted). A NoteOff (or NoteOn with velocity 0) with nothing
/// open is ignored, and notes still open when the track ends are dropped.
pub fn extract(tracks: &[Vec<RawEvent>]) -> Timeline {
    let mut notes: Vec<Note> = Vec::new();

    for (track_idx, track) in tracks.iter().enumerate() {
        let mut open_notes: HashMap<u8, (u64, u8)> = HashMap::new();

        for event in track.iter() {
            let is_note_on = event.kind == RawEventKind::NoteOn && event.velocity > 0;

            if is_note_on {
                let replaced = open_notes.insert(event.pitch, (event.tick, event.velocity));
                if let Some((start_tick, _)) = replaced {
                    debug!(
                        "Retriggered {} at tick {} discards the note opened at tick {} (track {})..!",
                        event.pitch, event.tick, start_tick, track_idx
                    );
                }
            } else if let Some((start_tick, velocity)) = open_notes.remove(&event.pitch) {
                notes.push(Note {
                    pitch: event.pitch,
                    velocity,
                    start_tick,
                    end_tick: event.tick,
                });
            } else {
                debug!(
                    "Orphaned NoteOff for {} at tick {} (track {})..!",
                    event.pitch, event.tick, track_idx
                );
            }
        }

        for (pitch, (start_tick, _)) in open_notes.into_iter() {
            warn!(
                "Unclosed NoteOn for {} at tick {} (track {}), dropping it..!",
                pitch, start_tick, track_idx
            );
        }
    }

    Timeline::from_notes(notes)
}
