//! Text-to-speech digests and the object store that serves them.

mod audio;
mod storage;
mod synthesizer;

pub use audio::{
    chunk_text, estimate_duration, prepare_text, AudioError, AudioRequest, AudioResult,
    AudioService, AUDIO_CONTENT_TYPE, DEFAULT_SEPARATOR, MAX_AUDIO_ITEMS,
};
pub use storage::{ObjectStorage, SignedUrl, StoredObject};
pub use synthesizer::{HttpSpeechSynthesizer, SpeechSynthesizer, Voice};
