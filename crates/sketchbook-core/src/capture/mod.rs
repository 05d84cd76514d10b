mod session;

pub use session::{
    CaptureSession, CaptureStatus, FinalizeIntent, PendingFinalize, StopMode, StopOutcome,
};
