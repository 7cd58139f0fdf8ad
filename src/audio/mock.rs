use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::source::{AudioSource, CaptureStream, StreamFormat};
use crate::error::DeviceError;

/// Deterministic microphone: replays scripted chunks, or refuses access.
#[derive(Debug, Clone)]
pub struct ScriptedMicrophone {
    format: StreamFormat,
    chunks: Vec<Vec<f32>>,
    refusal: Option<DeviceError>,
    monitor: DeviceMonitor,
}

/// Observes a [`ScriptedMicrophone`] from outside: how often it was opened, and whether a
/// stream is currently holding the device.
#[derive(Debug, Clone, Default)]
pub struct DeviceMonitor {
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
}

impl DeviceMonitor {
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl ScriptedMicrophone {
    pub fn new(format: StreamFormat, chunks: Vec<Vec<f32>>) -> Self {
        Self {
            format,
            chunks,
            refusal: None,
            monitor: DeviceMonitor::default(),
        }
    }

    pub fn denied() -> Self {
        Self::refusing(DeviceError::PermissionDenied)
    }

    pub fn refusing(err: DeviceError) -> Self {
        Self {
            refusal: Some(err),
            ..Self::new(StreamFormat { sample_rate: 16_000, channels: 1 }, Vec::new())
        }
    }

    pub fn monitor(&self) -> DeviceMonitor {
        self.monitor.clone()
    }
}

impl AudioSource for ScriptedMicrophone {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        if let Some(err) = &self.refusal {
            return Err(err.clone());
        }
        self.monitor.opened.fetch_add(1, Ordering::SeqCst);
        self.monitor.live.store(true, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            format: self.format,
            pending: self.chunks.iter().cloned().collect(),
            live: self.monitor.live.clone(),
        }))
    }
}

struct ScriptedStream {
    format: StreamFormat,
    pending: VecDeque<Vec<f32>>,
    live: Arc<AtomicBool>,
}

impl CaptureStream for ScriptedStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn drain(&mut self, into: &mut Vec<f32>) -> usize {
        let before = into.len();
        for chunk in self.pending.drain(..) {
            into.extend_from_slice(&chunk);
        }
        into.len() - before
    }

    fn close(self: Box<Self>) {}
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}
