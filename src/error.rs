use std::path::PathBuf;
use thiserror::Error;

/// The MIDI source could not be turned into note events.
#[derive(Error, Debug)]
pub enum FileFormatError {
    #[error("Failed to read MIDI file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse MIDI: {0}")]
    Parse(String),
}
