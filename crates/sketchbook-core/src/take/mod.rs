mod store;
#[allow(clippy::module_inception)]
mod take;

pub use {
    store::{MAX_TAKES, TakeStore},
    take::{EncodedAudio, FALSE_START_LABEL, Take, TakeKind},
};
