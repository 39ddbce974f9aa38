// Resampling of decoded windows to the model's sample rate

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::PipelineError;

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The sinc filter's group delay is removed and the result is cut to
/// `round(len * to_rate / from_rate)` samples, so output length depends only
/// on the input length and the two rates.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, PipelineError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1).map_err(|e| {
        PipelineError::Decode {
            reason: format!("resampler init {}->{} Hz: {}", from_rate, to_rate, e),
        }
    })?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut chunk = vec![0.0f32; CHUNK_SIZE];
    let mut position = 0usize;

    // Trailing zero chunks flush the filter tail.
    while output.len() < delay + expected {
        chunk.fill(0.0);
        if position < samples.len() {
            let end = (position + CHUNK_SIZE).min(samples.len());
            chunk[..end - position].copy_from_slice(&samples[position..end]);
        }
        position += CHUNK_SIZE;

        let resampled = resampler
            .process(std::slice::from_ref(&chunk), None)
            .map_err(|e| PipelineError::Decode {
                reason: format!("resample: {}", e),
            })?;

        match resampled.first() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
            _ => break,
        }
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}
