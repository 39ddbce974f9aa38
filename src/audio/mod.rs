// Audio module - clip decoding and the Waveform type
//
// Everything here runs once per request and keeps no state between calls.

pub mod loader;
pub mod resample;
pub mod waveform;

pub use loader::AudioLoader;
pub use waveform::{Peak, Waveform};
