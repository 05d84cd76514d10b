use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

/// Label attached to takes recorded before a restart.
pub const FALSE_START_LABEL: &str = "fs";

/// Opaque encoded audio payload with its mime tag.
///
/// Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    bytes: Arc<[u8]>,
    mime: Arc<str>,
}

impl EncodedAudio {
    /// Wrap encoded bytes.
    pub fn new(bytes: Vec<u8>, mime: &str) -> Self {
        Self {
            bytes: Arc::from(bytes),
            mime: Arc::from(mime),
        }
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mime/codec tag, e.g. `audio/wav`.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// How a take came to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TakeKind {
    /// Finished by an ordinary stop.
    Normal,
    /// Finished by a restart; kept for reference.
    FalseStart {
        /// Short label shown next to the take.
        label: String,
    },
}

/// One completed, immutable recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Take {
    id: Uuid,
    audio: EncodedAudio,
    kind: TakeKind,
}

impl Take {
    /// A take finished by a regular stop.
    pub fn normal(audio: EncodedAudio) -> Self {
        Self {
            id: Uuid::new_v4(),
            audio,
            kind: TakeKind::Normal,
        }
    }

    /// A take finished by a restart.
    pub fn false_start(audio: EncodedAudio) -> Self {
        Self {
            id: Uuid::new_v4(),
            audio,
            kind: TakeKind::FalseStart {
                label: FALSE_START_LABEL.to_string(),
            },
        }
    }

    /// Unique id of this take.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Encoded payload.
    pub fn audio(&self) -> &EncodedAudio {
        &self.audio
    }

    /// Normal or false start.
    pub fn kind(&self) -> &TakeKind {
        &self.kind
    }

    /// True for takes recorded before a restart.
    pub fn is_false_start(&self) -> bool {
        matches!(self.kind, TakeKind::FalseStart { .. })
    }

    /// Label, present only on false starts.
    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            TakeKind::Normal => None,
            TakeKind::FalseStart { label } => Some(label),
        }
    }
}
