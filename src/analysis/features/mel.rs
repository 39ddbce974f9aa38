// Mel filterbank on the Slaney mel scale
//
// Linear below 1 kHz, logarithmic above, with each triangular band scaled by
// 2 / (upper - lower) so all bands have equal area. Only the non-zero span of
// each band is stored.

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Hz to mel (Slaney)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Mel to Hz (Slaney)
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

struct Band {
    first_bin: usize,
    weights: Vec<f32>,
}

/// Triangular mel filterbank applied to power spectra
pub struct MelFilterbank {
    bands: Vec<Band>,
    bin_count: usize,
}

impl MelFilterbank {
    /// Build the filterbank for an FFT of `n_fft` points
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f32, fmax: f32) -> Self {
        let bin_count = n_fft / 2 + 1;
        let fft_freqs: Vec<f64> = (0..bin_count)
            .map(|k| k as f64 * f64::from(sample_rate) / n_fft as f64)
            .collect();

        let mel_min = hz_to_mel(f64::from(fmin));
        let mel_max = hz_to_mel(f64::from(fmax));
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let bands = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (upper - lower);

                let dense: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        rising.min(falling).max(0.0) * enorm
                    })
                    .collect();

                let first = dense.iter().position(|&w| w > 0.0);
                let last = dense.iter().rposition(|&w| w > 0.0);
                match (first, last) {
                    (Some(first), Some(last)) => Band {
                        first_bin: first,
                        weights: dense[first..=last].iter().map(|&w| w as f32).collect(),
                    },
                    _ => Band {
                        first_bin: 0,
                        weights: Vec::new(),
                    },
                }
            })
            .collect();

        Self { bands, bin_count }
    }

    #[cfg(test)]
    pub fn n_mels(&self) -> usize {
        self.bands.len()
    }

    /// Project one power spectrum onto the mel bands
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        debug_assert_eq!(power.len(), self.bin_count);
        self.bands
            .iter()
            .map(|band| {
                band.weights
                    .iter()
                    .zip(&power[band.first_bin..])
                    .map(|(w, p)| w * p)
                    .sum()
            })
            .collect()
    }

    /// Dense weight of `bin` in band `band` (zero outside the band)
    #[cfg(test)]
    pub fn weight(&self, band: usize, bin: usize) -> f32 {
        let band = &self.bands[band];
        bin.checked_sub(band.first_bin)
            .and_then(|offset| band.weights.get(offset))
            .copied()
            .unwrap_or(0.0)
    }
}
