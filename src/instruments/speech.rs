use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::source::{AudioSource, CaptureStream};
use crate::audio::wav::{encode_wav, AudioRecording};
use crate::error::{DeviceError, InstrumentError, TransitionError, ValidationError};
use crate::kernel::lifecycle::{Lifecycle, StateMachine};
use crate::kernel::result::OperationResult;
use crate::kernel::telemetry::event::{DeviceFailureKind, RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;
use crate::services::llm::types::{SpeechAnalysisRequest, SpeechArtifact};
use crate::services::llm::ReasoningClient;

/// Passage the user reads aloud while recording.
pub const READING_PASSAGE: &str = "The quick brown fox jumps over the lazy dog. I went to the park and saw many beautiful flowers. The sun was shining brightly in the clear blue sky.";

/// Sent as the transcript when only audio is available.
pub const AUDIO_TRANSCRIPT_HINT: &str = "The user provided an audio recording for analysis. The transcript should be generated from the audio.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    Recording,
    Recorded,
    Playing,
}

impl Lifecycle for CaptureState {
    const INSTRUMENT: &'static str = "audio_capture";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (CaptureState::Idle, CaptureState::Recording),
        (CaptureState::Recording, CaptureState::Recorded),
        // Finalizing failed; nothing to keep.
        (CaptureState::Recording, CaptureState::Idle),
        (CaptureState::Recorded, CaptureState::Playing),
        (CaptureState::Playing, CaptureState::Recorded),
        (CaptureState::Recorded, CaptureState::Idle),
        (CaptureState::Playing, CaptureState::Idle),
    ];

    fn label(self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Recording => "recording",
            CaptureState::Recorded => "recorded",
            CaptureState::Playing => "playing",
        }
    }
}

/// Records one spoken sample and submits it for speech analysis.
///
/// The device is held only between [`SpeechInstrument::start_recording`] and
/// [`SpeechInstrument::stop_recording`], and is released if the instrument is dropped mid-recording.
pub struct SpeechInstrument {
    machine: StateMachine<CaptureState>,
    source: Box<dyn AudioSource>,
    stream: Option<Box<dyn CaptureStream>>,
    buffer: Vec<f32>,
    recording: Option<AudioRecording>,
    telemetry: Telemetry,
}

impl SpeechInstrument {
    pub fn new(source: Box<dyn AudioSource>, telemetry: Telemetry) -> Self {
        Self {
            machine: StateMachine::new(CaptureState::Idle, telemetry.clone()),
            source,
            stream: None,
            buffer: Vec::new(),
            recording: None,
            telemetry,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.machine.state()
    }

    pub fn reading_passage(&self) -> &'static str {
        READING_PASSAGE
    }

    /// The finalized blob, present in `recorded` and `playing`.
    pub fn recording(&self) -> Option<&AudioRecording> {
        self.recording.as_ref()
    }

    /// `idle -> recording`. On a device error the instrument stays `idle`.
    pub fn start_recording(&mut self) -> Result<(), InstrumentError> {
        self.machine.ensure(CaptureState::Recording)?;

        let stream = match self.source.open() {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "microphone unavailable");
                self.record_device_failure(&err);
                return Err(err.into());
            }
        };

        let format = stream.format();
        self.buffer.clear();
        self.recording = None;
        self.stream = Some(stream);
        self.machine.advance(CaptureState::Recording)?;
        info!(sample_rate = format.sample_rate, channels = format.channels, "recording started");
        Ok(())
    }

    /// Pulls pending samples from the live stream into the buffer.
    pub fn pump(&mut self) -> usize {
        match self.stream.as_mut() {
            Some(stream) => stream.drain(&mut self.buffer),
            None => 0,
        }
    }

    /// `recording -> recorded`. Closes the stream, then finalizes the buffer into one WAV blob.
    pub fn stop_recording(&mut self) -> Result<&AudioRecording, InstrumentError> {
        self.machine.ensure(CaptureState::Recorded)?;
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| self.machine.illegal(CaptureState::Recorded))?;

        stream.drain(&mut self.buffer);
        let format = stream.format();
        stream.close();

        let samples = std::mem::take(&mut self.buffer);
        match encode_wav(&samples, format) {
            Ok(recording) => {
                self.machine.advance(CaptureState::Recorded)?;
                info!(
                    bytes = recording.bytes.len(),
                    seconds = recording.duration_secs(),
                    "recording finalized"
                );
                Ok(&*self.recording.insert(recording))
            }
            Err(err) => {
                warn!(error = %err, "could not finalize recording");
                self.record_device_failure(&err);
                self.machine.advance(CaptureState::Idle)?;
                Err(err.into())
            }
        }
    }

    /// `recorded -> playing`.
    pub fn play(&mut self) -> Result<(), TransitionError> {
        self.machine.advance(CaptureState::Playing).map(drop)
    }

    /// `playing -> recorded`.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.machine.advance(CaptureState::Recorded).map(drop)
    }

    pub fn toggle_playback(&mut self) -> Result<CaptureState, TransitionError> {
        match self.state() {
            CaptureState::Playing => self.pause()?,
            _ => self.play()?,
        }
        Ok(self.state())
    }

    /// Playback reached the end of the blob.
    pub fn media_ended(&mut self) -> Result<(), TransitionError> {
        if !self.machine.is(CaptureState::Playing) {
            return Err(self.machine.illegal(CaptureState::Recorded));
        }
        self.pause()
    }

    /// `recorded | playing -> idle`. Discards the blob.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.machine.advance(CaptureState::Idle)?;
        self.recording = None;
        Ok(())
    }

    /// Builds the speech-analysis payload from the current blob and `transcript`.
    ///
    /// Either may be missing; the service call itself rejects the case where both are.
    pub fn analysis_request(&self, transcript: &str) -> Result<SpeechAnalysisRequest, ValidationError> {
        if self.machine.is(CaptureState::Recording) {
            return Err(ValidationError::RecordingInProgress);
        }

        let audio_data_uri = self
            .recording
            .as_ref()
            .map(AudioRecording::to_data_uri)
            .unwrap_or_default();
        let transcript = if transcript.trim().is_empty() && !audio_data_uri.is_empty() {
            AUDIO_TRANSCRIPT_HINT.to_string()
        } else {
            transcript.to_string()
        };

        Ok(SpeechAnalysisRequest { audio_data_uri, transcript })
    }

    /// Issues the speech-analysis call. The result is handed back unchanged for the orchestrator.
    pub async fn analyze(
        &self,
        transcript: &str,
        client: &ReasoningClient,
    ) -> OperationResult<SpeechArtifact> {
        match self.analysis_request(transcript) {
            Ok(request) => client.analyze_speech(&request).await,
            Err(err) => {
                warn!(reason = %err, "speech analysis rejected");
                self.telemetry.record(TelemetryEvent::ValidationRejected {
                    kind: RejectionKind::from(&err),
                });
                OperationResult::failed(err.to_string())
            }
        }
    }

    fn record_device_failure(&self, err: &DeviceError) {
        self.telemetry.record(TelemetryEvent::DeviceFailure {
            kind: DeviceFailureKind::from(err),
        });
    }
}

impl Drop for SpeechInstrument {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.close();
            info!("recording abandoned; microphone released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::ScriptedMicrophone;
    use crate::audio::source::StreamFormat;

    const MONO_16K: StreamFormat = StreamFormat { sample_rate: 16_000, channels: 1 };

    fn instrument(mic: ScriptedMicrophone) -> SpeechInstrument {
        SpeechInstrument::new(Box::new(mic), Telemetry::new())
    }

    #[test]
    fn start_stop_produces_wav_blob() {
        let mic = ScriptedMicrophone::new(MONO_16K, vec![vec![0.1; 160], vec![-0.1; 160]]);
        let mut speech = instrument(mic);

        speech.start_recording().unwrap();
        assert_eq!(speech.pump(), 320);
        let recording = speech.stop_recording().unwrap();
        assert_eq!(recording.frames, 320);
        assert_eq!(&recording.bytes[..4], b"RIFF");
        assert_eq!(speech.state(), CaptureState::Recorded);
    }

    #[test]
    fn denied_microphone_stays_idle() {
        let telemetry = Telemetry::new();
        let mut speech = SpeechInstrument::new(Box::new(ScriptedMicrophone::denied()), telemetry.clone());

        let err = speech.start_recording().unwrap_err();
        assert_eq!(err, InstrumentError::Device(DeviceError::PermissionDenied));
        assert_eq!(speech.state(), CaptureState::Idle);
        assert_eq!(telemetry.snapshot().device_failures, 1);
    }

    #[test]
    fn playback_toggles_and_media_end_returns_to_recorded() {
        let mut speech = instrument(ScriptedMicrophone::new(MONO_16K, vec![vec![0.0; 16]]));
        speech.start_recording().unwrap();
        speech.stop_recording().unwrap();

        assert_eq!(speech.toggle_playback(), Ok(CaptureState::Playing));
        assert_eq!(speech.toggle_playback(), Ok(CaptureState::Recorded));
        speech.play().unwrap();
        speech.media_ended().unwrap();
        assert_eq!(speech.state(), CaptureState::Recorded);
        assert!(speech.media_ended().is_err());
    }

    #[test]
    fn playback_needs_a_recording() {
        let mut speech = instrument(ScriptedMicrophone::new(MONO_16K, Vec::new()));
        assert!(speech.toggle_playback().is_err());
        assert_eq!(speech.state(), CaptureState::Idle);
    }

    #[test]
    fn reset_discards_blob() {
        let mut speech = instrument(ScriptedMicrophone::new(MONO_16K, vec![vec![0.0; 16]]));
        speech.start_recording().unwrap();
        speech.stop_recording().unwrap();
        speech.play().unwrap();

        speech.reset().unwrap();
        assert_eq!(speech.state(), CaptureState::Idle);
        assert!(speech.recording().is_none());
        assert!(speech.reset().is_err());
    }

    #[test]
    fn audio_without_transcript_carries_hint() {
        let mut speech = instrument(ScriptedMicrophone::new(MONO_16K, vec![vec![0.2; 16]]));
        speech.start_recording().unwrap();
        speech.stop_recording().unwrap();

        let request = speech.analysis_request("   ").unwrap();
        assert!(request.audio_data_uri.starts_with("data:audio/wav;base64,UklGR"));
        assert_eq!(request.transcript, AUDIO_TRANSCRIPT_HINT);
    }

    #[test]
    fn transcript_only_leaves_uri_empty() {
        let speech = instrument(ScriptedMicrophone::new(MONO_16K, Vec::new()));
        let request = speech.analysis_request("I went to the park").unwrap();
        assert!(request.audio_data_uri.is_empty());
        assert_eq!(request.transcript, "I went to the park");
    }

    #[test]
    fn request_while_recording_is_rejected() {
        let mut speech = instrument(ScriptedMicrophone::new(MONO_16K, Vec::new()));
        speech.start_recording().unwrap();
        assert_eq!(
            speech.analysis_request("hello"),
            Err(ValidationError::RecordingInProgress)
        );
    }
}
