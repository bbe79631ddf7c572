//! Audio output backends for ptplayer.

mod cpal_backend;
mod traits;

pub use cpal_backend::{fill_interleaved, CpalOutput};
pub use traits::{AudioError, AudioOutput};
