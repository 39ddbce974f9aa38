// AudioLoader - decode, downmix and window an input clip
//
// Decoding goes through symphonia's probe, so WAV always works and FLAC, MP3,
// OGG/Vorbis and AAC/M4A work as far as the enabled codecs allow. The window
// is cut at the source's native rate and only then resampled, so the 0.5 s
// offset means the same thing for every input rate.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::resample::resample;
use super::waveform::Waveform;
use crate::config::AudioConfig;
use crate::error::PipelineError;

/// Loads the fixed analysis window of a clip as a mono waveform
#[derive(Debug, Clone)]
pub struct AudioLoader {
    target_sample_rate: u32,
    offset_secs: f32,
    duration_secs: f32,
}

impl AudioLoader {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            target_sample_rate: config.target_sample_rate,
            offset_secs: config.offset_secs,
            duration_secs: config.duration_secs,
        }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Decode a file on disk
    ///
    /// The file extension is passed to the format probe as a hint only; the
    /// container is identified from its content.
    pub fn load_path(&self, path: &Path) -> Result<Waveform, PipelineError> {
        let file = File::open(path).map_err(|err| PipelineError::Decode {
            reason: format!("opening {}: {}", path.display(), err),
        })?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        self.load_source(Box::new(file), hint)
    }

    /// Decode an in-memory clip, e.g. an HTTP request body
    pub fn load_bytes(&self, data: &[u8], extension: Option<&str>) -> Result<Waveform, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::Decode {
                reason: "input is empty".to_string(),
            });
        }

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        self.load_source(Box::new(Cursor::new(data.to_vec())), hint)
    }

    fn load_source(&self, source: Box<dyn MediaSource>, hint: Hint) -> Result<Waveform, PipelineError> {
        let (start, len) = (self.offset_secs, self.duration_secs);
        let decoded = decode_window(source, hint, start, len)?;

        if decoded.window.is_empty() {
            return Err(PipelineError::EmptyAudio {
                offset_secs: self.offset_secs,
                source_secs: decoded.source_frames as f32 / decoded.sample_rate as f32,
            });
        }

        let samples = resample(&decoded.window, decoded.sample_rate, self.target_sample_rate)?;
        Ok(Waveform::new(samples, self.target_sample_rate))
    }
}

struct DecodedWindow {
    window: Vec<f32>,
    sample_rate: u32,
    /// Mono frames decoded before stopping (may stop early once the window is full)
    source_frames: usize,
}

/// Highest container sample rate accepted
const MAX_SOURCE_SAMPLE_RATE: u32 = 384_000;

/// Upper bound on the initial mono buffer reservation
const MAX_PREALLOCATED_FRAMES: usize = 1 << 20;

fn seconds_to_frames(sample_rate: u32, secs: f32) -> usize {
    // Float-to-int `as` saturates; offsets and durations are validated non-negative.
    (f64::from(sample_rate) * f64::from(secs)).round() as usize
}

fn decode_error(stage: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Decode {
        reason: format!("{}: {}", stage, err),
    }
}

fn decode_window(
    source: Box<dyn MediaSource>,
    hint: Hint,
    offset_secs: f32,
    duration_secs: f32,
) -> Result<DecodedWindow, PipelineError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error("unsupported or unrecognised container", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error("probe", "no audio track found"))?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let sample_rate = codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| decode_error("probe", "audio track has no sample rate"))?;
    if sample_rate > MAX_SOURCE_SAMPLE_RATE {
        return Err(decode_error(
            "probe",
            format!(
                "declared sample rate {} Hz exceeds {} Hz",
                sample_rate, MAX_SOURCE_SAMPLE_RATE
            ),
        ));
    }

    let start = seconds_to_frames(sample_rate, offset_secs);
    let end = start
        .checked_add(seconds_to_frames(sample_rate, duration_secs))
        .ok_or_else(|| decode_error("probe", "analysis window overflows"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error("codec init failed", e))?;

    // Header values are untrusted; grow past this instead of reserving `end` up front.
    let mut mono: Vec<f32> = Vec::with_capacity(end.min(MAX_PREALLOCATED_FRAMES));

    while mono.len() < end {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error("packet read", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| decode_error("decode", e))?;

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        if sample_buf.samples().iter().any(|s| !s.is_finite()) {
            return Err(decode_error("decode", "stream contains NaN or infinite samples"));
        }

        // Mix to mono
        if channels > 1 {
            mono.extend(
                sample_buf
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            mono.extend_from_slice(sample_buf.samples());
        }
    }

    let source_frames = mono.len();
    let window = if start < mono.len() {
        mono[start..end.min(mono.len())].to_vec()
    } else {
        Vec::new()
    };

    Ok(DecodedWindow {
        window,
        sample_rate,
        source_frames,
    })
}
