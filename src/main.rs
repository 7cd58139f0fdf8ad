use anyhow::{bail, Context, Result};
use clap::Parser;
use cogscreen::audio::source::{AudioSource, Unavailable};
use cogscreen::error::InstrumentError;
use cogscreen::instruments::recall::run_countdown;
use cogscreen::instruments::speech::READING_PASSAGE;
use cogscreen::kernel::telemetry::metrics::TelemetrySnapshot;
use cogscreen::services::llm::types::OperationKind;
use cogscreen::{OperationResult, Screening, ScreeningConfig, SessionContext};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Terminal cognitive screening: word recall, speech sample, pattern quiz, risk score.
#[derive(Parser, Debug)]
#[command(name = "cogscreen", version, about)]
struct Args {
    /// JSON config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reasoning service base URL.
    #[arg(long)]
    service_url: Option<String>,

    /// Skip the microphone and analyze a typed transcript only.
    #[arg(long)]
    transcript_only: bool,

    #[arg(long)]
    skip_pattern: bool,
}

/// Line reader over stdin.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }

    async fn line(&mut self) -> Result<String> {
        match self.lines.next_line().await? {
            Some(line) => Ok(line),
            None => bail!("input closed"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let args = Args::parse();
    let mut config = ScreeningConfig::load(args.config.as_deref())?;
    if let Some(url) = args.service_url {
        config.service.base_url = url;
        config.validate()?;
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let source = microphone(args.transcript_only);
    let mut screening = Screening::connect(config, SessionContext::active(), source)?;
    let mut prompt = Prompt::new();

    tracing::info!("Screening session started");

    if !run_recall(&mut screening, &mut prompt, &cancel).await? {
        println!("\nCancelled.");
        return Ok(());
    }
    run_speech(&mut screening, &mut prompt, args.transcript_only).await?;
    if !args.skip_pattern {
        run_pattern(&mut screening, &mut prompt).await?;
    }
    run_risk(&mut screening).await;

    print_telemetry(&screening.telemetry().snapshot());
    Ok(())
}

fn microphone(transcript_only: bool) -> Box<dyn AudioSource> {
    if transcript_only {
        return Box::new(Unavailable::new("transcript-only mode"));
    }
    default_source()
}

#[cfg(feature = "microphone")]
fn default_source() -> Box<dyn AudioSource> {
    Box::new(cogscreen::audio::CpalMicrophone::new())
}

#[cfg(not(feature = "microphone"))]
fn default_source() -> Box<dyn AudioSource> {
    Box::new(Unavailable::new("built without the `microphone` feature"))
}

async fn run_recall(
    screening: &mut Screening,
    prompt: &mut Prompt,
    cancel: &CancellationToken,
) -> Result<bool> {
    let recall = screening.recall()?;
    let words = recall.start()?.to_vec();

    println!("\n== Word recall ==");
    println!("Memorize these words:\n\n    {}\n", words.join("   "));

    let finished = run_countdown(recall, cancel, |remaining| {
        print!("\r{remaining:>3}s remaining");
        let _ = std::io::stdout().flush();
    })
    .await?;
    if !finished {
        return Ok(false);
    }

    // Hide the list before recall begins.
    print!("\x1b[2J\x1b[H");
    println!("Type the words you remember, separated by spaces or commas:");

    let outcome = loop {
        let line = prompt.line().await?;
        match screening.submit_recall(&line).await {
            Ok(outcome) => break outcome,
            Err(InstrumentError::Validation(err)) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    };

    let artifact = &outcome.artifact;
    println!(
        "\nYou recalled {} of {} words in {:.2} seconds: {}",
        artifact.score(),
        artifact.total(),
        artifact.recall_duration_seconds,
        artifact.correct_words.join(", ")
    );
    match (&outcome.analysis, &outcome.error) {
        (Some(analysis), _) => println!("\nAnalysis:\n{analysis}"),
        (None, Some(error)) => println!("\n{error}"),
        (None, None) => {}
    }
    Ok(true)
}

async fn run_speech(
    screening: &mut Screening,
    prompt: &mut Prompt,
    transcript_only: bool,
) -> Result<()> {
    println!("\n== Speech sample ==");
    println!("Read this passage aloud:\n\n    {READING_PASSAGE}\n");

    if !transcript_only {
        record(screening, prompt).await?;
    }

    println!("Type a transcript of what you read (optional), then press Enter:");
    let transcript = prompt.line().await?;
    match screening.analyze_speech(&transcript).await? {
        OperationResult::Succeeded(artifact) => {
            println!("\nSpeech analysis:\n{}", artifact.cognitive_decline_indicators)
        }
        OperationResult::Failed(message) => println!("\n{message}"),
    }
    Ok(())
}

async fn record(screening: &mut Screening, prompt: &mut Prompt) -> Result<()> {
    let speech = screening.speech()?;
    if let Err(err) = speech.start_recording() {
        println!("{err}");
        return Ok(());
    }
    println!("Recording. Press Enter to stop.");

    let mut cadence = interval(Duration::from_millis(100));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            line = prompt.line() => {
                line?;
                break;
            }
            _ = cadence.tick() => {
                speech.pump();
            }
        }
    }

    match speech.stop_recording() {
        Ok(recording) => println!("Recorded {:.1} seconds.", recording.duration_secs()),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

async fn run_pattern(screening: &mut Screening, prompt: &mut Prompt) -> Result<()> {
    println!("\n== Pattern sequences ==");
    let quiz = screening.pattern()?;

    while let Some(puzzle) = quiz.current() {
        let (index, total) = quiz.position();
        println!("\nPuzzle {}/{}: {}", index + 1, total, puzzle.prompt());

        let feedback = loop {
            let line = prompt.line().await?;
            match quiz.submit_text(&line) {
                Ok(feedback) => break feedback,
                Err(InstrumentError::Validation(err)) => println!("{err}"),
                Err(err) => return Err(err.into()),
            }
        };
        if feedback.correct {
            println!("Correct! {}", feedback.rule);
        } else {
            println!("Not quite. The answer was {}. {}", feedback.expected, feedback.rule);
        }
        quiz.next()?;
    }

    if let Some(score) = quiz.final_score() {
        println!("\nPattern score: {}/{}", score.correct, score.total);
    }
    Ok(())
}

async fn run_risk(screening: &mut Screening) {
    println!("\n== Risk assessment ==");
    match screening.score_risk().await {
        OperationResult::Succeeded(assessment) => {
            println!(
                "Risk score: {}/100 ({})",
                assessment.risk_score,
                assessment.band().label()
            );
            println!("\nRisk factors:\n{}", assessment.risk_factors);
            println!("\nRecommendations:\n{}", assessment.recommendations);
            match screening.export() {
                Ok(path) => println!("\nReport saved to {}", path.display()),
                Err(err) => println!("\nExport failed: {err}"),
            }
        }
        OperationResult::Failed(message) => println!("{message}"),
    }
}

fn print_telemetry(snapshot: &TelemetrySnapshot) {
    println!("\n== Session telemetry ==");
    println!("transitions: {}", snapshot.transitions);
    for operation in [
        OperationKind::CognitiveTaskAnalysis,
        OperationKind::SpeechAnalysis,
        OperationKind::RiskScoring,
    ] {
        let stats = snapshot.calls_for(operation);
        println!(
            "{}: {} ok, {} failed, {} rejected, avg {:.0} ms",
            operation.label(),
            stats.succeeded,
            stats.failed,
            stats.rejected,
            stats.avg_latency_ms
        );
    }
    println!(
        "device failures: {}, validation rejections: {}",
        snapshot.device_failures, snapshot.validation_rejections
    );
}
