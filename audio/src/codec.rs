use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::AudioError;

/// Sample rate the protocol fixes for PCM16 audio in both directions.
pub const WIRE_SAMPLE_RATE: f64 = 24000.0;

/// The wire format is mono.
pub const WIRE_CHANNELS: u16 = 1;

/// Decodes a base64 payload into raw little-endian PCM16 bytes.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, AudioError> {
    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| AudioError::MalformedPayload(e.to_string()))
}

/// Encodes raw PCM16 bytes for an `input_audio_buffer.append` payload.
pub fn encode_base64(pcm: &[u8]) -> String {
    STANDARD.encode(pcm)
}

/// Interprets little-endian PCM16 bytes as normalized f32 samples.
/// A trailing odd byte is dropped.
pub fn pcm16_to_f32(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|chunk| {
            let v = i16::from_le_bytes([chunk[0], chunk[1]]);
            (v as f32 / 32768.0).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Converts normalized f32 samples to little-endian PCM16 bytes.
/// The 1/32768 scale is symmetric with [`pcm16_to_f32`], so every i16
/// value survives a round trip exactly.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        pcm.extend_from_slice(&quantize(*sample).to_le_bytes());
    }
    pcm
}

fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32768.0).clamp(-32768.0, 32767.0) as i16
}

/// G.711 µ-law companding of one linear PCM16 sample.
pub fn linear_to_mulaw(sample: i16) -> u8 {
    const BIAS: i32 = 0x84;
    const CLIP: i32 = 32635;

    let mut pcm = i32::from(sample);
    let sign: u8 = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0x00
    };
    if pcm > CLIP {
        pcm = CLIP;
    }
    pcm += BIAS;

    let mut exponent: u8 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && pcm & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = ((pcm >> (i32::from(exponent) + 3)) & 0x0f) as u8;
    !(sign | (exponent << 4) | mantissa)
}

/// µ-law encodes a block of normalized f32 samples.
pub fn f32_to_mulaw(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|sample| linear_to_mulaw(quantize(*sample)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pcm16_round_trips_through_f32() {
        let pcm: Vec<u8> = [0i16, 1000, -1000, i16::MAX, i16::MIN]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let samples = pcm16_to_f32(&pcm);
        assert_eq!(samples.len(), 5);
        assert_eq!(f32_to_pcm16(&samples), pcm);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let samples = pcm16_to_f32(&[0x00, 0x40, 0x7f]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn base64_round_trip() {
        let pcm = vec![0u8, 1, 2, 3, 254, 255];
        let encoded = encode_base64(&pcm);
        assert_eq!(decode_base64(&encoded).expect("decode"), pcm);
    }

    #[test]
    fn malformed_base64_is_an_error() {
        assert!(decode_base64("not//valid!!").is_err());
    }

    #[test]
    fn mulaw_reference_points() {
        // Silence companding is 0xff, extremes are 0x00 / 0x80.
        assert_eq!(linear_to_mulaw(0), 0xff);
        assert_eq!(linear_to_mulaw(i16::MIN + 1), 0x00);
        assert_eq!(linear_to_mulaw(i16::MAX), 0x80);
    }
}
