use log::debug;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Display name for a MIDI key, e.g. `60 -> "C4"`, `69 -> "A4"`.
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

/// Nearest MIDI key for a detected frequency, or `None` outside of 1..=127.
pub fn frequency_to_midi(frequency_hz: f32) -> Option<u8> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }

    let key = (12.0 * (frequency_hz / 440.0).log2() + 69.0).round();
    (1.0..=127.0).contains(&key).then_some(key as u8)
}

/// Parses a typed pitch: a MIDI number (`60`), a note name (`C4`, `f#3`, `Bb2`) or a
/// frequency (`440hz`).
pub fn parse_pitch(input: &str) -> Option<u8> {
    let token = input.trim();
    if token.is_empty() {
        return None;
    }

    let lower = token.to_lowercase();
    if let Some(hz) = lower.strip_suffix("hz") {
        return hz.trim().parse::<f32>().ok().and_then(frequency_to_midi);
    }

    if let Ok(midi) = token.parse::<u8>() {
        return (midi <= 127).then_some(midi);
    }

    let mut chars = lower.chars();
    let base: i32 = match chars.next()? {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        other => {
            debug!("Unrecognised pitch '{}' (starts with '{}')..!", token, other);
            return None;
        }
    };

    let rest = chars.as_str();
    let (accidental, octave) = if let Some(octave) = rest.strip_prefix('#') {
        (1, octave)
    } else if let Some(octave) = rest.strip_prefix('b') {
        (-1, octave)
    } else {
        (0, rest)
    };

    let octave: i32 = octave.parse().ok()?;
    let midi = (octave + 1) * 12 + base + accidental;

    (0..=127).contains(&midi).then_some(midi as u8)
}
