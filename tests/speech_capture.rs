mod common;

use cogscreen::audio::mock::ScriptedMicrophone;
use cogscreen::audio::source::StreamFormat;
use cogscreen::error::{DeviceError, InstrumentError, TransitionError};
use cogscreen::instruments::speech::{CaptureState, SpeechInstrument, AUDIO_TRANSCRIPT_HINT};
use cogscreen::kernel::result::OperationResult;
use cogscreen::kernel::telemetry::recorder::Telemetry;
use cogscreen::services::llm::types::{OperationKind, SpeechArtifact};
use cogscreen::services::llm::ReasoningClient;
use common::{as_service, speech_reply, ScriptedService};

const MONO_16K: StreamFormat = StreamFormat { sample_rate: 16_000, channels: 1 };

fn microphone() -> ScriptedMicrophone {
    ScriptedMicrophone::new(MONO_16K, vec![vec![0.25; 1_600], vec![-0.25; 1_600]])
}

#[test]
fn test_start_stop_lifecycle_and_device_release() {
    let mic = microphone();
    let monitor = mic.monitor();
    let mut speech = SpeechInstrument::new(Box::new(mic), Telemetry::new());

    speech.start_recording().unwrap();
    assert_eq!(speech.state(), CaptureState::Recording);
    assert!(monitor.is_live());

    // Second start while recording is an illegal edge.
    assert!(matches!(
        speech.start_recording(),
        Err(InstrumentError::Transition(TransitionError::Illegal { from: "recording", .. }))
    ));
    assert_eq!(monitor.open_count(), 1);

    speech.pump();
    let recording = speech.stop_recording().unwrap();
    assert_eq!(recording.mime_type, "audio/wav");
    assert!((recording.duration_secs() - 0.2).abs() < 1e-9);
    assert_eq!(speech.state(), CaptureState::Recorded);
    assert!(!monitor.is_live(), "stop must release the device");
}

#[test]
fn test_stop_without_pump_keeps_every_sample() {
    let mut speech = SpeechInstrument::new(Box::new(microphone()), Telemetry::new());

    speech.start_recording().unwrap();
    let recording = speech.stop_recording().unwrap();
    assert_eq!(recording.frames, 3_200);
    assert!((recording.duration_secs() - 0.2).abs() < 1e-9);
}

#[test]
fn test_dropping_mid_recording_releases_device() {
    let mic = microphone();
    let monitor = mic.monitor();
    let mut speech = SpeechInstrument::new(Box::new(mic), Telemetry::new());

    speech.start_recording().unwrap();
    assert!(monitor.is_live());
    drop(speech);
    assert!(!monitor.is_live());
}

#[test]
fn test_permission_denied_is_recoverable() {
    let telemetry = Telemetry::new();
    let mut speech = SpeechInstrument::new(Box::new(ScriptedMicrophone::denied()), telemetry.clone());

    for _ in 0..2 {
        let err = speech.start_recording().unwrap_err();
        assert_eq!(err, InstrumentError::Device(DeviceError::PermissionDenied));
        assert_eq!(speech.state(), CaptureState::Idle);
    }
    assert_eq!(telemetry.snapshot().device_failures, 2);
}

#[test]
fn test_stop_without_start_is_rejected() {
    let mut speech = SpeechInstrument::new(Box::new(microphone()), Telemetry::new());
    assert!(matches!(speech.stop_recording(), Err(InstrumentError::Transition(_))));
}

#[tokio::test]
async fn test_recorded_audio_is_sent_as_data_uri() {
    let telemetry = Telemetry::new();
    let service = ScriptedService::new();
    service.reply(OperationKind::SpeechAnalysis, speech_reply("Fluent, no notable pauses."));
    let client = ReasoningClient::new(as_service(&service), telemetry.clone());

    let mut speech = SpeechInstrument::new(Box::new(microphone()), telemetry);
    speech.start_recording().unwrap();
    speech.stop_recording().unwrap();

    let result = speech.analyze("", &client).await;
    assert_eq!(
        result,
        OperationResult::Succeeded(SpeechArtifact {
            cognitive_decline_indicators: "Fluent, no notable pauses.".into(),
        })
    );

    let payload = &service.payloads_for(OperationKind::SpeechAnalysis)[0];
    let uri = payload["audioDataUri"].as_str().unwrap();
    assert!(uri.starts_with("data:audio/wav;base64,"));
    assert_eq!(payload["transcript"], AUDIO_TRANSCRIPT_HINT);
}

#[tokio::test]
async fn test_transcript_only_analysis() {
    let service = ScriptedService::new();
    service.reply(OperationKind::SpeechAnalysis, speech_reply("Word-finding pauses."));
    let client = ReasoningClient::new(as_service(&service), Telemetry::new());

    let speech = SpeechInstrument::new(Box::new(ScriptedMicrophone::denied()), Telemetry::new());
    let result = speech.analyze("The quick brown fox... um... jumps.", &client).await;
    assert!(result.is_ok());

    let payload = &service.payloads_for(OperationKind::SpeechAnalysis)[0];
    assert_eq!(payload["audioDataUri"], "");
    assert_eq!(payload["transcript"], "The quick brown fox... um... jumps.");
}

#[tokio::test]
async fn test_empty_speech_input_never_reaches_service() {
    let telemetry = Telemetry::new();
    let service = ScriptedService::new();
    let client = ReasoningClient::new(as_service(&service), telemetry.clone());

    let speech = SpeechInstrument::new(Box::new(microphone()), telemetry.clone());
    let result = speech.analyze("   ", &client).await;

    assert_eq!(result.error(), Some("Audio or transcript is required for speech analysis."));
    assert!(result.value().is_none());
    assert!(service.calls().is_empty());

    let stats = telemetry.snapshot().calls_for(OperationKind::SpeechAnalysis);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
async fn test_service_failure_uses_uniform_message() {
    let service = ScriptedService::new();
    service.fail(OperationKind::SpeechAnalysis);
    let client = ReasoningClient::new(as_service(&service), Telemetry::new());

    let speech = SpeechInstrument::new(Box::new(microphone()), Telemetry::new());
    let result = speech.analyze("hello", &client).await;
    assert_eq!(
        result,
        OperationResult::Failed(
            "An unexpected error occurred during speech analysis. Please try again later.".into()
        )
    );
}
