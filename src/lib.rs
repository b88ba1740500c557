mod engine;
mod error;
mod library;
mod midi_importer;
mod model;
mod player;
mod util;

pub use engine::capture::*;
pub use engine::clock::*;
pub use engine::*;
pub use error::*;
pub use library::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::song::*;
pub use player::*;
pub use util::*;
