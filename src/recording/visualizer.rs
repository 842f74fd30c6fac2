//! Live frequency-spectrum visualization using FFT.
//!
//! Turns the most recent capture samples into per-column display magnitudes
//! covering the human voice band. Purely derived state: the analyzer keeps
//! nothing beyond the smoothed bins for the current frame.

use rustfft::{num_complex::Complex, FftPlanner};

const FFT_SIZE: usize = 2048;

/// Voice band rendered by the spectrum display, in Hz.
const MIN_FREQ: f32 = 100.0;
const MAX_FREQ: f32 = 1500.0;

/// Stateful spectrum analyzer with an internal FFT planner.
pub struct SpectrumAnalyzer {
    fft_planner: FftPlanner<f32>,
    display_bins: Vec<u64>,
    num_bins: usize,
}

impl SpectrumAnalyzer {
    /// Creates an analyzer producing `num_bins` display columns.
    pub fn new(num_bins: usize) -> Self {
        Self {
            fft_planner: FftPlanner::new(),
            display_bins: vec![0u64; num_bins],
            num_bins,
        }
    }

    /// Recomputes the spectrum from fresh samples, smoothing against the
    /// previous frame to reduce visual jitter.
    pub fn update(&mut self, samples: &[i16], sample_rate: u32, reference_level_db: i8) {
        let new_bins = spectrum_bins(
            samples,
            sample_rate,
            self.num_bins,
            reference_level_db,
            &mut self.fft_planner,
        );

        for (old, new) in self.display_bins.iter_mut().zip(new_bins.iter()) {
            *old = (*old + *new) / 2;
        }
    }

    /// Adapts the analyzer to a new terminal width.
    pub fn resize(&mut self, num_bins: usize) {
        self.num_bins = num_bins;
        self.display_bins = vec![0u64; num_bins];
    }

    /// Current display magnitudes, normalized to 0-100.
    pub fn bins(&self) -> &[u64] {
        &self.display_bins
    }
}

/// Computes spectrum magnitudes from audio samples.
///
/// Applies a Hanning window to the most recent samples, runs a forward FFT,
/// and folds the 100-1500 Hz band into `num_bins` columns normalized to
/// 0-100 against the configured reference level. Magnitudes below a noise
/// gate 35 dB under the reference level render as zero.
pub fn spectrum_bins(
    samples: &[i16],
    sample_rate: u32,
    num_bins: usize,
    reference_level_db: i8,
    fft_planner: &mut FftPlanner<f32>,
) -> Vec<u64> {
    if samples.is_empty() || sample_rate == 0 || num_bins == 0 {
        return vec![0u64; num_bins];
    }

    let sample_count = samples.len().min(FFT_SIZE);
    let recent = &samples[samples.len() - sample_count..];

    // Hanning window reduces spectral leakage
    let mut buffer: Vec<Complex<f32>> = recent
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let window =
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / sample_count as f32).cos());
            Complex::new(s as f32 * window / 32768.0, 0.0)
        })
        .collect();
    buffer.resize(FFT_SIZE, Complex::new(0.0, 0.0));

    let fft = fft_planner.plan_fft_forward(FFT_SIZE);
    fft.process(&mut buffer);

    let freq_resolution = sample_rate as f32 / FFT_SIZE as f32;
    let min_bin = (MIN_FREQ / freq_resolution) as usize;
    let max_bin = (MAX_FREQ / freq_resolution).min((FFT_SIZE / 2) as f32) as usize;

    let noise_gate_db = reference_level_db as f32 - 35.0;
    let useful_bins = max_bin.saturating_sub(min_bin).max(1);
    let mut result = vec![0u64; num_bins];

    for (display_idx, column) in result.iter_mut().enumerate() {
        let start_bin = min_bin + (display_idx * useful_bins) / num_bins;
        let end_bin = (min_bin + ((display_idx + 1) * useful_bins) / num_bins)
            .min(max_bin)
            .max(start_bin + 1);

        if start_bin >= max_bin {
            break;
        }

        let mut sum = 0.0;
        let mut count = 0;
        for bin_idx in start_bin..end_bin {
            if bin_idx < buffer.len() / 2 {
                sum += buffer[bin_idx].norm();
                count += 1;
            }
        }

        if count == 0 {
            continue;
        }

        let avg_magnitude = sum / count as f32;
        let db = if avg_magnitude > 1e-10 {
            20.0 * avg_magnitude.log10()
        } else {
            -100.0
        };

        // FFT energy concentrates relative to RMS metering; pull it down 20 dB
        // so the bars track the same scale as a volume meter would.
        let adjusted_db = db - 20.0;

        if adjusted_db >= noise_gate_db {
            let db_range = reference_level_db as f32 - noise_gate_db;
            let normalized = ((adjusted_db - noise_gate_db) / db_range * 100.0).clamp(0.0, 100.0);
            *column = normalized as u64;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_samples_produce_silent_bins() {
        let mut planner = FftPlanner::new();
        let bins = spectrum_bins(&[], 16000, 40, -20, &mut planner);
        assert_eq!(bins, vec![0u64; 40]);
    }

    #[test]
    fn loud_voice_band_tone_lights_up_bins() {
        // 440 Hz tone at high amplitude, well inside the displayed band
        let sample_rate = 16000u32;
        let samples: Vec<i16> = (0..FFT_SIZE)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 20000.0) as i16
            })
            .collect();

        let mut planner = FftPlanner::new();
        let bins = spectrum_bins(&samples, sample_rate, 40, -20, &mut planner);
        assert!(bins.iter().any(|&b| b > 0), "tone should register in the band");
        assert!(bins.iter().all(|&b| b <= 100), "bins normalized to 0-100");
    }

    #[test]
    fn silence_stays_below_noise_gate() {
        let samples = vec![0i16; FFT_SIZE];
        let mut planner = FftPlanner::new();
        let bins = spectrum_bins(&samples, 16000, 40, -20, &mut planner);
        assert!(bins.iter().all(|&b| b == 0));
    }
}
