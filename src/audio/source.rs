use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Something that can hand out a live microphone stream.
pub trait AudioSource {
    /// Acquires the device. Denial or absence is reported, never panics.
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, DeviceError>;
}

/// A live input stream. Dropping it, or calling [`CaptureStream::close`], releases the device.
pub trait CaptureStream {
    fn format(&self) -> StreamFormat;

    /// Moves every sample captured so far into `into`. Returns how many were moved.
    fn drain(&mut self, into: &mut Vec<f32>) -> usize;

    fn close(self: Box<Self>);
}

/// Source for environments with no capture backend; every open is refused.
#[derive(Debug, Clone, Default)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl AudioSource for Unavailable {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        Err(DeviceError::Unsupported(self.reason.clone()))
    }
}
