//! services/api/src/pipeline/wav.rs
//!
//! Wraps the raw PCM returned by the speech model in a WAV container.

use hound::{SampleFormat, WavSpec, WavWriter};

/// Sample rate of the speech model's PCM output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Size of the canonical PCM WAV header written by [`pcm16_to_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Encodes 16-bit little-endian mono PCM as a WAV file.
///
/// The output is `pcm.len() + 44` bytes for even-length input; a dangling odd
/// byte is not a complete sample and is dropped.
pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::with_capacity(pcm_data.len() + WAV_HEADER_LEN));

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for chunk in pcm_data.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn le_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn header_describes_mono_24khz_pcm() {
        let pcm: Vec<u8> = (0..200u16).flat_map(|s| (s as i16 * 97).to_le_bytes()).collect();
        let n = pcm.len();
        let wav = pcm16_to_wav(&pcm, SPEECH_SAMPLE_RATE).unwrap();

        assert_eq!(wav.len(), n + WAV_HEADER_LEN);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(le_u32(&wav, 4) as usize, n + 36);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(le_u32(&wav, 16), 16);
        assert_eq!(le_u16(&wav, 20), 1);
        assert_eq!(le_u16(&wav, 22), 1);
        assert_eq!(le_u32(&wav, 24), 24_000);
        assert_eq!(le_u32(&wav, 28), 48_000);
        assert_eq!(le_u16(&wav, 32), 2);
        assert_eq!(le_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(le_u32(&wav, 40) as usize, n);
        assert_eq!(&wav[44..], &pcm[..]);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let wav = pcm16_to_wav(&[1, 0, 2, 0, 9], SPEECH_SAMPLE_RATE).unwrap();
        assert_eq!(wav.len(), 4 + WAV_HEADER_LEN);
        assert_eq!(&wav[44..], &[1, 0, 2, 0]);
    }

    #[test]
    fn empty_pcm_yields_bare_header() {
        let wav = pcm16_to_wav(&[], SPEECH_SAMPLE_RATE).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(le_u32(&wav, 40), 0);
    }
}
