use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::error::AudioError;

/// Creates a mono resampler converting between two sample rates, consuming
/// fixed `chunk_size` blocks.
pub fn create_resampler(
    in_rate: f64,
    out_rate: f64,
    chunk_size: usize,
) -> Result<FastFixedIn<f32>, AudioError> {
    let resampler = FastFixedIn::<f32>::new(
        out_rate / in_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits samples into fixed-size chunks, zero-padding the last one.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Mono sample-rate converter between a device rate and the wire rate.
///
/// Equal rates skip conversion entirely; the input buffer moves through
/// untouched.
pub enum RateConverter {
    Passthrough,
    Chunked {
        resampler: FastFixedIn<f32>,
        chunk_size: usize,
    },
}

impl RateConverter {
    pub fn new(in_rate: f64, out_rate: f64, chunk_size: usize) -> Result<Self, AudioError> {
        if (in_rate - out_rate).abs() < f64::EPSILON {
            return Ok(RateConverter::Passthrough);
        }
        Ok(RateConverter::Chunked {
            resampler: create_resampler(in_rate, out_rate, chunk_size)?,
            chunk_size,
        })
    }

    pub fn convert(&mut self, samples: Vec<f32>) -> Result<Vec<f32>, AudioError> {
        match self {
            RateConverter::Passthrough => Ok(samples),
            RateConverter::Chunked {
                resampler,
                chunk_size,
            } => {
                let mut out = Vec::with_capacity(samples.len());
                for chunk in split_for_chunks(&samples, *chunk_size) {
                    let mut resampled = resampler.process(&[chunk], None)?;
                    if let Some(channel) = resampled.pop() {
                        out.extend(channel);
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Integer-factor decimation with a box filter, for the 24 kHz → 8 kHz
/// telephony leg.
pub fn decimate(samples: &[f32], factor: usize) -> Vec<f32> {
    if factor <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(factor)
        .map(|window| window.iter().sum::<f32>() / window.len() as f32)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn passthrough_keeps_samples_untouched() {
        let mut converter = RateConverter::new(24000.0, 24000.0, 512).expect("converter");
        assert!(matches!(converter, RateConverter::Passthrough));
        let samples = vec![0.25, -0.5, 0.75];
        assert_eq!(converter.convert(samples.clone()).expect("convert"), samples);
    }

    #[test]
    fn chunked_conversion_scales_length_by_ratio() {
        let mut converter = RateConverter::new(48000.0, 24000.0, 512).expect("converter");
        let samples = vec![0.0f32; 1024];
        let out = converter.convert(samples).expect("convert");
        // Two full chunks in, half as many frames out.
        assert_eq!(out.len(), 512);
    }

    #[test]
    fn split_pads_final_chunk() {
        let chunks = split_for_chunks(&[1.0, 2.0, 3.0], 2);
        assert_eq!(chunks, vec![vec![1.0, 2.0], vec![3.0, 0.0]]);
    }

    #[test]
    fn decimate_averages_windows() {
        let out = decimate(&[0.0, 0.3, 0.6, 0.9, 0.9, 0.9], 3);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] - 0.9).abs() < 1e-6);
    }
}
