pub mod conductor;

pub use conductor::{Conductor, ManualClock, PlaybackClock};
