//! Sample sources feeding the draw engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Samples are rounded to this many decimal places.
pub const SAMPLE_DECIMALS: i32 = 8;

/// Supplies uniform samples in `[0, 1]` to the draw engine.
pub trait SampleSource {
    fn next_sample(&mut self) -> f64;
}

/// Uniform random samples with fixed decimal precision.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Seed from operating-system entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl SampleSource for RandomSampler {
    fn next_sample(&mut self) -> f64 {
        round_sample(self.rng.gen::<f64>())
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSampler {
    samples: Vec<f64>,
    position: usize,
}

impl ScriptedSampler {
    #[must_use]
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        Self {
            samples: samples.into(),
            position: 0,
        }
    }
}

impl SampleSource for ScriptedSampler {
    fn next_sample(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.position % self.samples.len()];
        self.position = self.position.wrapping_add(1);
        sample
    }
}

fn round_sample(raw: f64) -> f64 {
    let scale = 10f64.powi(SAMPLE_DECIMALS);
    (raw * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_samples_stay_in_unit_interval_with_fixed_precision() {
        let mut sampler = RandomSampler::from_entropy();
        let scale = 10f64.powi(SAMPLE_DECIMALS);
        for _ in 0..1_000 {
            let sample = sampler.next_sample();
            assert!((0.0..=1.0).contains(&sample));
            assert!(((sample * scale).round() - sample * scale).abs() < 1e-6);
        }
    }

    #[test]
    fn scripted_sampler_cycles() {
        let mut sampler = ScriptedSampler::new(vec![0.1, 0.9]);
        assert!((sampler.next_sample() - 0.1).abs() < f64::EPSILON);
        assert!((sampler.next_sample() - 0.9).abs() < f64::EPSILON);
        assert!((sampler.next_sample() - 0.1).abs() < f64::EPSILON);
    }
}
