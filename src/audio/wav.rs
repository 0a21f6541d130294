//! In-memory WAV encoding of finalized recordings.

use std::io::Cursor;

use super::backend::AudioError;

/// MIME type of every recording produced by [`encode_wav`].
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Encode mono `samples` as a 16-bit PCM WAV file at `sample_rate` Hz.
///
/// Samples outside `[-1.0, 1.0]` are clipped.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::Encode(e.to_string()))?;
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| AudioError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn header_describes_mono_16bit() {
        let bytes = encode_wav(&[0.0; 160], 16_000).unwrap();
        let (spec, samples) = decode(&bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples.len(), 160);
    }

    #[test]
    fn out_of_range_samples_are_clipped() {
        let bytes = encode_wav(&[2.0, -2.0], 16_000).unwrap();
        let (_, samples) = decode(&bytes);
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn empty_input_is_valid_file() {
        let bytes = encode_wav(&[], 16_000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert!(decode(&bytes).1.is_empty());
    }
}
