//! Confmix - conference mixer simulator
//!
//! Runs a simulated N-party conference: every participant speaks a distinct
//! tone into its own buffered source and listens to a personalised mix that
//! leaves its own voice out. Each listener is drained by a consumer thread
//! fed through a bounded handoff channel. A scripted ZRTP negotiation drives
//! the security callback alongside the audio.

use anyhow::Result;
use chrono::{DateTime, Utc};
use confmix::audio::format::AudioFormat;
use confmix::audio::source::InputSource;
use confmix::audio::stream::ChannelTransferHandler;
use confmix::security::codes::{InfoCode, WarningCode};
use confmix::security::messages::MessageSeverity;
use confmix::security::session::{SessionId, SessionType};
use confmix::stats::store::RunningStats;
use confmix::{
    BufferedSource, CallModel, Config, KeyAgreementCallback, MixerCore, SecurityEventManager,
    ToneGenerator,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{error, info, warn};

const DEFAULT_PARTICIPANTS: usize = 3;
const DEFAULT_CYCLES: usize = 50;

/// Command line errors
#[derive(Error, Debug)]
enum ArgError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),

    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },

    #[error("Unknown argument: {0}")]
    Unknown(String),
}

#[derive(Debug)]
struct Options {
    participants: usize,
    cycles: usize,
    config: Option<PathBuf>,
    write_config: Option<PathBuf>,
    json: bool,
}

enum Command {
    Run(Options),
    Help,
    Version,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("confmix=info".parse()?)
                .add_directive("confmix_core=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Version) => {
            println!("confmix {}", confmix::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            return Ok(());
        }
    };

    if !options.json {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!(
            "║          Confmix v{} - Conference Mixer Simulator        ║",
            confmix::VERSION
        );
        println!("╚════════════════════════════════════════════════════════════╝");
        println!();
    }

    let config = match &options.config {
        Some(path) => Config::load(path),
        None => Config::default(),
    };

    if let Some(path) = &options.write_config {
        config.save(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let summary = run_conference(&config, &options)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Command, ArgError> {
    let mut options = Options {
        participants: DEFAULT_PARTICIPANTS,
        cycles: DEFAULT_CYCLES,
        config: None,
        write_config: None,
        json: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-v" => return Ok(Command::Version),
            "--json" => options.json = true,
            "--participants" | "-n" => {
                options.participants = parse_count(iter.next(), "--participants")?;
            }
            "--cycles" | "-c" => {
                options.cycles = parse_count(iter.next(), "--cycles")?;
            }
            "--config" => {
                let value = iter.next().ok_or(ArgError::MissingValue("--config"))?;
                options.config = Some(PathBuf::from(value));
            }
            "--write-config" => {
                let value = iter
                    .next()
                    .ok_or(ArgError::MissingValue("--write-config"))?;
                options.write_config = Some(PathBuf::from(value));
            }
            other => return Err(ArgError::Unknown(other.to_string())),
        }
    }
    Ok(Command::Run(options))
}

fn parse_count(value: Option<&String>, flag: &'static str) -> Result<usize, ArgError> {
    let value = value.ok_or(ArgError::MissingValue(flag))?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ArgError::InvalidValue {
            flag,
            value: value.clone(),
        }),
    }
}

fn print_help() {
    println!("Usage: confmix [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -n, --participants N    Conference participants (default: {DEFAULT_PARTICIPANTS})");
    println!("  -c, --cycles N          Mix cycles to run (default: {DEFAULT_CYCLES})");
    println!("      --config PATH       Load settings from a JSON config file");
    println!("      --write-config PATH Write the effective config and exit");
    println!("      --json              Print the run summary as JSON");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  confmix -n 5 -c 500");
    println!("  confmix --config confmix.json --json");
}

/// Per-participant result of a run
#[derive(Debug, Serialize)]
struct ParticipantSummary {
    source: String,
    stream: String,
    tone_hz: f64,
    frames_received: u64,
    bytes_received: u64,
    dropped_samples: u64,
}

/// Result of a simulated conference
#[derive(Debug, Serialize)]
struct RunSummary {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    format: AudioFormat,
    cycles: usize,
    participants: Vec<ParticipantSummary>,
    mixer: RunningStats,
    average_sources: f64,
    security_updates: usize,
}

struct Participant {
    source: Arc<BufferedSource>,
    tone: ToneGenerator,
    stream: Arc<confmix::ListenerStream>,
    consumer: JoinHandle<(u64, u64)>,
}

fn run_conference(config: &Config, options: &Options) -> Result<RunSummary> {
    let started_at = Utc::now();
    let settings = &config.mixer;
    let core = MixerCore::new(settings.format)?;

    let mut participants = Vec::with_capacity(options.participants);
    for index in 0..options.participants {
        let source = Arc::new(BufferedSource::new(
            settings.frame_samples,
            settings.source_capacity,
        ));
        core.add_input_source(source.clone());

        let frequency = settings.base_frequency + 100.0 * index as f64;
        let tone = ToneGenerator::new(
            frequency,
            settings.sample_rate,
            settings.tone_amplitude,
            settings.format,
        )?;

        let stream = core.create_output_stream([source.id()]);
        let (handler, rx) = ChannelTransferHandler::bounded(settings.handoff_capacity);
        stream.set_transfer_handler(handler);
        stream.start();

        let reader = Arc::clone(&stream);
        let consumer = std::thread::spawn(move || {
            let mut frames = 0u64;
            let mut bytes = 0u64;
            for _ in rx.iter() {
                match reader.read() {
                    Ok(Some(data)) => {
                        frames += 1;
                        bytes += data.len() as u64;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(stream = %reader.id(), error = %e, "Failed to read mix");
                        break;
                    }
                }
            }
            (frames, bytes)
        });

        info!(participant = index, source = %source.id(), stream = %stream.id(), frequency, "Participant joined");
        participants.push(Participant {
            source,
            tone,
            stream,
            consumer,
        });
    }

    let call = Arc::new(LoggingCall::default());
    let security = Arc::new(SecurityEventManager::with_messages(
        call.clone(),
        config.messages.clone(),
    ));
    let master = security.create_master_session(SessionType::Audio);
    security.start_session(master)?;

    for cycle in 0..options.cycles {
        for participant in &mut participants {
            let frame = participant.tone.next_frame(settings.frame_samples);
            participant.source.push(&frame);
        }
        core.on_data_available();

        script_security(cycle, options.cycles, &security, master, &call)?;
    }

    core.stop();
    call.ended.store(true, Ordering::Release);
    security.callback(master).secure_off();
    security.end_call();

    let mut summaries = Vec::with_capacity(participants.len());
    for participant in participants {
        participant.stream.stop();
        participant.stream.clear_transfer_handler();
        let (frames_received, bytes_received) = match participant.consumer.join() {
            Ok(counts) => counts,
            Err(_) => {
                warn!(stream = %participant.stream.id(), "Consumer thread panicked");
                (0, 0)
            }
        };
        summaries.push(ParticipantSummary {
            source: participant.source.id().to_string(),
            stream: participant.stream.id().to_string(),
            tone_hz: participant.tone.frequency(),
            frames_received,
            bytes_received,
            dropped_samples: participant.source.dropped_samples(),
        });
    }

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        format: settings.format,
        cycles: options.cycles,
        participants: summaries,
        mixer: core.stats(),
        average_sources: core.average_sources(),
        security_updates: call.updates.load(Ordering::Relaxed),
    })
}

/// Feed the security callback a typical negotiation spread over the run
fn script_security(
    cycle: usize,
    cycles: usize,
    security: &Arc<SecurityEventManager>,
    master: SessionId,
    call: &LoggingCall,
) -> Result<()> {
    let callback = security.callback(master);
    match cycle {
        0 => callback.show_message(InfoCode::HelloReceived.into()),
        1 => {
            callback.secure_on("AES-256");
            callback.show_sas("ab12", false);
            callback.show_message(InfoCode::SecureStateOn.into());
        }
        2 if call.derived_requested.swap(false, Ordering::AcqRel) => {
            let video = security.create_derived_session(master, SessionType::Video)?;
            security.start_session(video)?;
            let derived = security.callback(video);
            derived.secure_on("AES-256");
            derived.show_message(InfoCode::SecureStateOn.into());
        }
        n if n == cycles / 2 => callback.show_message(WarningCode::NoRsMatch.into()),
        _ => {}
    }
    Ok(())
}

/// Call model printing every security update
#[derive(Default)]
struct LoggingCall {
    updates: AtomicUsize,
    derived_requested: AtomicBool,
    ended: AtomicBool,
}

impl CallModel for LoggingCall {
    fn set_security_on(
        &self,
        session_type: SessionType,
        cipher: Option<&str>,
        sas: Option<&str>,
        verified: bool,
    ) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        info!(
            %session_type,
            cipher = cipher.unwrap_or("-"),
            sas = sas.unwrap_or("-"),
            verified,
            "Call secure"
        );
    }

    fn set_security_off(&self, session_type: SessionType) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        info!(%session_type, "Call no longer secure");
    }

    fn set_security_message(&self, message_type: &str, text: &str, severity: MessageSeverity) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        warn!(message_type, %severity, "{}", text);
    }

    fn start_derived_sessions(&self) -> usize {
        self.derived_requested.store(true, Ordering::Release);
        1
    }

    fn is_call_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Conference summary");
    println!("────────────────────────────────────────");
    println!(
        "Cycles: {} | Empty: {} | Frames delivered: {} | Underruns: {}",
        summary.mixer.cycles,
        summary.mixer.empty_cycles,
        summary.mixer.frames_delivered,
        summary.mixer.underruns
    );
    println!("Average speakers per cycle: {:.2}", summary.average_sources);
    for participant in &summary.participants {
        println!(
            "  {} ({:>6.1} Hz) -> {}: {:>5} frames, {:>8} bytes, {} dropped",
            participant.source,
            participant.tone_hz,
            participant.stream,
            participant.frames_received,
            participant.bytes_received,
            participant.dropped_samples
        );
    }
    println!("Security updates: {}", summary.security_updates);
    println!(
        "Duration: {} ms",
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
}
