use crate::{CoreResult, take::EncodedAudio};

use uuid::Uuid;

/// Completion of work run off the controller task.
///
/// Every variant carries the generation it was started for; the controller
/// drops or releases results whose generation is no longer current.
pub(crate) enum SessionEvent<St, Tp, Pl> {
    /// Microphone open finished.
    DeviceGranted {
        generation: u64,
        result: CoreResult<St>,
    },
    /// Analysis tap open finished.
    AnalysisGranted {
        generation: u64,
        result: CoreResult<Tp>,
    },
    /// Encoder finished a take.
    Finalized {
        generation: u64,
        result: CoreResult<EncodedAudio>,
    },
    /// Decoder finished loading a take.
    Loaded {
        generation: u64,
        take_id: Uuid,
        result: CoreResult<Pl>,
    },
    /// Duration probe finished.
    DurationProbed {
        generation: u64,
        result: CoreResult<f64>,
    },
}
