mod session;

pub use session::{EndedOutcome, PlaybackSession, PlaybackStatus, SeekOutcome};
