use crate::util::pitch_name;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    NoteOn,
    NoteOff,
}

/// A channel voice message at an absolute tick, as read from one track.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub pitch: u8,
    pub velocity: u8,
    pub tick: u64,
}

impl RawEvent {
    pub fn note_on(pitch: u8, velocity: u8, tick: u64) -> Self {
        Self {
            kind: RawEventKind::NoteOn,
            pitch,
            velocity,
            tick,
        }
    }

    pub fn note_off(pitch: u8, tick: u64) -> Self {
        Self {
            kind: RawEventKind::NoteOff,
            pitch,
            velocity: 0,
            tick,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

impl Note {
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }

    pub fn name(&self) -> String {
        pitch_name(self.pitch)
    }
}

/// Notes sharing one exact start tick. Never empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "ChordGroupRepr")]
pub struct ChordGroup {
    notes: Vec<Note>,
}

impl ChordGroup {
    /// Returns `None` if `notes` is empty or the start ticks differ.
    pub fn new(notes: Vec<Note>) -> Option<Self> {
        let first = notes.first()?.start_tick;

        if notes.iter().any(|n| n.start_tick != first) {
            return None;
        }

        Some(Self { notes })
    }

    pub fn start_tick(&self) -> u64 {
        self.notes.first().map_or(0, |n| n.start_tick)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Distinct pitches, ascending.
    pub fn pitches(&self) -> std::collections::BTreeSet<u8> {
        self.notes.iter().map(|n| n.pitch).collect()
    }
}

#[derive(Deserialize)]
struct ChordGroupRepr {
    notes: Vec<Note>,
}

impl TryFrom<ChordGroupRepr> for ChordGroup {
    type Error = String;

    fn try_from(repr: ChordGroupRepr) -> Result<Self, Self::Error> {
        ChordGroup::new(repr.notes)
            .ok_or_else(|| "chord group must be non-empty with one start tick".to_string())
    }
}

/// Chord groups with strictly increasing start ticks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(try_from = "TimelineRepr")]
pub struct Timeline {
    groups: Vec<ChordGroup>,
}

#[derive(Deserialize)]
struct TimelineRepr {
    groups: Vec<ChordGroup>,
}

impl TryFrom<TimelineRepr> for Timeline {
    type Error = String;

    fn try_from(repr: TimelineRepr) -> Result<Self, Self::Error> {
        if let Some(pair) = repr
            .groups
            .windows(2)
            .find(|pair| pair[0].start_tick() >= pair[1].start_tick())
        {
            return Err(format!(
                "chord groups out of order: tick {} followed by tick {}",
                pair[0].start_tick(),
                pair[1].start_tick()
            ));
        }

        Ok(Self {
            groups: repr.groups,
        })
    }
}

impl Timeline {
    /// Groups notes by exact start tick. The sort is stable, so notes sharing a tick keep
    /// the order they were given in.
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        notes.sort_by_key(|n| n.start_tick);

        let mut groups: Vec<ChordGroup> = Vec::new();
        let mut pending: Vec<Note> = Vec::new();

        for note in notes.into_iter() {
            if let Some(last) = pending.last()
                && last.start_tick != note.start_tick
            {
                groups.extend(ChordGroup::new(std::mem::take(&mut pending)));
            }
            pending.push(note);
        }
        groups.extend(ChordGroup::new(pending));

        groups.sort_by_key(|g| g.start_tick());

        Self { groups }
    }

    pub fn groups(&self) -> &[ChordGroup] {
        &self.groups
    }

    pub fn get(&self, index: usize) -> Option<&ChordGroup> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.groups.iter().map(|g| g.notes.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn note(pitch: u8, start_tick: u64) -> Note {
        Note {
            pitch,
            velocity: 100,
            start_tick,
            end_tick: start_tick + 10,
        }
    }

    #[test]
    fn chord_group_rejects_mixed_or_empty() {
        assert!(ChordGroup::new(Vec::new()).is_none());
        assert!(ChordGroup::new(vec![note(60, 0), note(64, 1)]).is_none());
        assert!(ChordGroup::new(vec![note(60, 5), note(64, 5)]).is_some());
    }

    #[test]
    fn groups_are_strictly_increasing() {
        let timeline = Timeline::from_notes(vec![
            note(67, 100),
            note(60, 0),
            note(64, 100),
            note(72, 50),
        ]);

        assert_eq!(timeline.len(), 3);
        let starts: Vec<u64> = timeline.groups().iter().map(|g| g.start_tick()).collect();
        assert_eq!(starts, vec![0, 50, 100]);
        assert!(timeline.groups().iter().all(|g| !g.notes().is_empty()));

        // ties keep input order
        let pitches: Vec<u8> = timeline.groups()[2].notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![67, 64]);
    }

    #[test]
    fn chord_pitches_collapse_duplicates() {
        let group = ChordGroup::new(vec![note(60, 0), note(60, 0), note(64, 0)]).unwrap();
        assert_eq!(group.pitches().into_iter().collect::<Vec<_>>(), vec![60, 64]);
    }

    #[test]
    fn malformed_timelines_are_rejected() {
        let empty_group = serde_json::from_str::<Timeline>(r#"{"groups":[{"notes":[]}]}"#);
        assert!(empty_group.is_err());

        let mixed = r#"{"groups":[{"notes":[
            {"pitch":60,"velocity":90,"start_tick":0,"end_tick":10},
            {"pitch":64,"velocity":90,"start_tick":5,"end_tick":10}]}]}"#;
        assert!(serde_json::from_str::<Timeline>(mixed).is_err());

        let unordered = r#"{"groups":[
            {"notes":[{"pitch":60,"velocity":90,"start_tick":100,"end_tick":110}]},
            {"notes":[{"pitch":62,"velocity":90,"start_tick":100,"end_tick":120}]}]}"#;
        assert!(serde_json::from_str::<Timeline>(unordered).is_err());
    }

    #[test]
    fn timeline_json_round_trip() {
        let timeline = Timeline::from_notes(vec![note(60, 0), note(64, 0), note(67, 96)]);

        let json = serde_json::to_string(&timeline).expect("timeline serialises");
        let back: Timeline = serde_json::from_str(&json).expect("timeline deserialises");
        assert_eq!(back, timeline);
    }

    #[test]
    fn empty_timeline() {
        let timeline = Timeline::from_notes(Vec::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline.note_count(), 0);
    }
}
