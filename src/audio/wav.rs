use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

use super::source::StreamFormat;
use crate::error::DeviceError;

/// Container format of every finalized recording.
pub const RECORDING_MIME_TYPE: &str = "audio/wav";

/// A finalized recording. Owned by the speech instrument while `recorded` or `playing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRecording {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub format: StreamFormat,
    pub frames: usize,
}

impl AudioRecording {
    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.format.sample_rate as f64
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        data_uri(self.mime_type, &self.bytes)
    }
}

pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Packs interleaved f32 samples into a 16-bit PCM WAV blob.
pub fn encode_wav(samples: &[f32], format: StreamFormat) -> Result<AudioRecording, DeviceError> {
    if format.channels == 0 || format.sample_rate == 0 {
        return Err(DeviceError::Encode(format!(
            "invalid stream format {}Hz x{}",
            format.sample_rate, format.channels
        )));
    }

    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
    }

    Ok(AudioRecording {
        bytes: cursor.into_inner(),
        mime_type: RECORDING_MIME_TYPE,
        format,
        frames: samples.len() / format.channels as usize,
    })
}

fn encode_error(err: hound::Error) -> DeviceError {
    DeviceError::Encode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO_16K: StreamFormat = StreamFormat { sample_rate: 16_000, channels: 1 };

    #[test]
    fn encoded_blob_is_readable_wav() {
        let samples = vec![0.0, 0.5, -0.5, 1.0, -1.0, 2.0];
        let recording = encode_wav(&samples, MONO_16K).unwrap();

        let reader = hound::WavReader::new(Cursor::new(recording.bytes.clone())).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 6);
        assert_eq!(decoded[3], i16::MAX);
        assert_eq!(decoded[5], i16::MAX); // clamped
        assert_eq!(recording.frames, 6);
    }

    #[test]
    fn data_uri_carries_mime_and_base64() {
        assert_eq!(data_uri("audio/wav", b"RIFF"), "data:audio/wav;base64,UklGRg==");
    }

    #[test]
    fn zero_channels_is_rejected() {
        let format = StreamFormat { sample_rate: 16_000, channels: 0 };
        assert!(matches!(encode_wav(&[0.0], format), Err(DeviceError::Encode(_))));
    }
}
