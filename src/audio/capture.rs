use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{error, info};

use super::source::{AudioSource, CaptureStream, StreamFormat};
use crate::error::DeviceError;

/// Seconds of audio the ring buffer holds between drains.
const BUFFER_SECONDS: usize = 4;

/// Default system input device via cpal.
#[derive(Debug, Default)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSource for CpalMicrophone {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(DeviceError::NoDevice)?;

        info!("Audio input device: {}", device.name().unwrap_or_default());

        let config = device
            .default_input_config()
            .map_err(|e| DeviceError::Unsupported(e.to_string()))?;
        let format = StreamFormat {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };
        info!(
            "Audio config selected: rate={}Hz channels={}",
            format.sample_rate, format.channels
        );

        let capacity = format.sample_rate as usize * format.channels as usize * BUFFER_SECONDS;
        let (mut producer, consumer) = HeapRb::<f32>::new(capacity.max(1)).split();

        let err_fn = |err| error!("input stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| {
                    // Lossy when full.
                    producer.push_slice(data);
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| {
                    for &sample in data {
                        let _ = producer.try_push(sample as f32 / i16::MAX as f32);
                    }
                },
                err_fn,
                None,
            ),
            other => {
                return Err(DeviceError::Unsupported(format!("sample format {other:?}")));
            }
        }
        .map_err(build_error)?;

        stream.play().map_err(|e| DeviceError::Stream(e.to_string()))?;

        Ok(Box::new(CpalStream {
            stream: Some(stream),
            consumer,
            format,
        }))
    }
}

fn build_error(err: cpal::BuildStreamError) -> DeviceError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::NoDevice,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            DeviceError::Unsupported("stream config".into())
        }
        other => DeviceError::Stream(other.to_string()),
    }
}

struct CpalStream {
    stream: Option<cpal::Stream>,
    consumer: HeapCons<f32>,
    format: StreamFormat,
}

impl CaptureStream for CpalStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn drain(&mut self, into: &mut Vec<f32>) -> usize {
        let before = into.len();
        while let Some(sample) = self.consumer.try_pop() {
            into.push(sample);
        }
        into.len() - before
    }

    fn close(mut self: Box<Self>) {
        self.release();
    }
}

impl CpalStream {
    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                error!("failed to pause input stream: {}", e);
            }
            info!("Audio input released");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}
