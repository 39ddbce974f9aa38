// Cepstrum module - log compression and DCT of mel spectra

const AMIN: f32 = 1e-10;

/// Convert a mel power matrix to decibels in place
///
/// Uses a reference power of 1.0. With `top_db`, every value is floored at
/// `max - top_db`, where `max` is taken over the whole matrix.
pub fn power_to_db(frames: &mut [Vec<f32>], top_db: Option<f32>) {
    for value in frames.iter_mut().flatten() {
        *value = 10.0 * value.max(AMIN).log10();
    }

    if let Some(top_db) = top_db {
        let peak = frames
            .iter()
            .flatten()
            .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        let floor = peak - top_db;
        for value in frames.iter_mut().flatten() {
            *value = value.max(floor);
        }
    }
}

/// Orthonormal DCT-II truncated to the first `n_out` coefficients
pub struct Dct {
    basis: Vec<Vec<f32>>,
}

impl Dct {
    pub fn new(n_in: usize, n_out: usize) -> Self {
        let n = n_in as f64;
        let basis = (0..n_out)
            .map(|k| {
                let norm = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_in)
                    .map(|i| {
                        let angle =
                            std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
                        (norm * angle.cos()) as f32
                    })
                    .collect()
            })
            .collect();

        Self { basis }
    }

    pub fn n_out(&self) -> usize {
        self.basis.len()
    }

    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        self.basis
            .iter()
            .map(|row| row.iter().zip(input).map(|(b, x)| b * x).sum())
            .collect()
    }
}
