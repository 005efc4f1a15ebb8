//! Handcue CLI
//!
//! Usage:
//!   handcue session.json                         # Replay a recorded session
//!   handcue session.json --serve                 # ... and publish events on /ws
//!   handcue session.json --config handcue.json   # Load configuration from file
//!   handcue session.json --json                  # JSON lines output

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use handcue::core::{
    run_server, AudioCueSink, BroadcastSink, NotifyHub, PipelineDriver, Recording, RunExit,
    RunSummary, TerminalSink, ThreadedSink,
};
use handcue::types::{ChannelConfig, ChannelId, DebouncePolicy, FingerId, PipelineConfig};
use handcue::{HandcueError, DEFAULT_COOLDOWN_SECS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "handcue",
    version = VERSION,
    about = "Classify finger states per frame and emit debounced gesture events",
    long_about = "Handcue runs the per-frame hand classification pipeline over a\n\
                  recorded landmark session.\n\n\
                  Each frame's 21 hand landmarks are classified into Bent/Straight\n\
                  per finger. Channels turn those states into events:\n  \
                  left-hand-present   time-based cooldown (network notification)\n  \
                  index-bent          edge-reset (audio cue)\n\n\
                  Channel ids: hand-present, left-hand-present, right-hand-present,\n\
                  <finger>-bent, <finger>-straight"
)]
struct Args {
    /// Recorded session (JSON) to replay
    recording: PathBuf,

    /// Configuration file (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not mirror frames (disables selfie view)
    #[arg(long)]
    no_mirror: bool,

    /// Minimum detection confidence (0.0-1.0)
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Segment ratio below which middle/ring count as bent
    #[arg(long)]
    bend_ratio: Option<f64>,

    /// Cooldown in seconds applied to every channel
    #[arg(long)]
    cooldown: Option<f64>,

    /// Channel `<id>=<edge-reset|time-based>`, repeatable; replaces the
    /// configured channel list
    #[arg(long = "channel", value_name = "ID=POLICY")]
    channels: Vec<String>,

    /// Channels that trigger the audio cue (default: index-bent)
    #[arg(long = "sound", value_name = "ID")]
    sound: Vec<String>,

    /// Pause between frames in milliseconds (0 = as fast as possible)
    #[arg(long)]
    frame_interval_ms: Option<u64>,

    /// Publish events over HTTP/WebSocket
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:5001")]
    addr: String,

    /// Output as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(args).await {
        error!(error = %e, "handcue failed");
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "handcue=debug" } else { "handcue=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), HandcueError> {
    let config = build_config(&args)?;
    let recording = Recording::from_json_file(&args.recording)?;
    let sound_channels = parse_sound_channels(&args.sound)?;

    if !args.json {
        print_header(&args, &config, recording.len());
    }

    let (source, extractor) = recording.into_parts();
    let backlog = config.render_backlog;
    let mut driver = PipelineDriver::new(config, source, extractor)?;
    driver.add_sink(ThreadedSink::spawn(
        TerminalSink::stdout(!args.no_color, args.json),
        backlog,
    ));
    driver.add_sink(ThreadedSink::spawn(AudioCueSink::bell(sound_channels), backlog));

    let hub = NotifyHub::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = if args.serve {
        driver.add_sink(BroadcastSink::new(hub.clone()));
        let addr = args.addr.clone();
        let hub = hub.clone();
        Some(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            run_server(&addr, hub, shutdown).await
        }))
    } else {
        None
    };

    let running = driver.spawn()?;
    let stop = running.stop_handle();

    // Capture runs on its own thread; wait for it or for Ctrl-C
    let join = tokio::task::spawn_blocking(move || running.join());
    tokio::pin!(join);
    let joined = tokio::select! {
        joined = &mut join => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping capture");
            stop.stop();
            join.await
        }
    };

    let (driver, result) = joined
        .map_err(|e| HandcueError::source_read(format!("capture task failed: {}", e)))??;
    driver.shutdown();
    let summary = result?;
    print_summary(&summary, args.json, args.no_color);

    if let Some(server) = server {
        if summary.exit == RunExit::Exhausted {
            println!("Recording finished; still serving on {}. Press Ctrl-C to exit.", args.addr);
            let _ = tokio::signal::ctrl_c().await;
        }
        let _ = shutdown_tx.send(());
        server
            .await
            .map_err(|e| HandcueError::source_read(format!("server task failed: {}", e)))??;
    }
    Ok(())
}

/// Config file (or defaults) with CLI overrides applied
fn build_config(args: &Args) -> Result<PipelineConfig, HandcueError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if args.no_mirror {
        config.mirror_view = false;
    }
    if let Some(confidence) = args.min_confidence {
        config.min_detection_confidence = confidence;
    }
    if let Some(ratio) = args.bend_ratio {
        config.geometry.bend_ratio = ratio;
    }
    if let Some(interval) = args.frame_interval_ms {
        config.frame_interval_ms = interval;
    }
    if !args.channels.is_empty() {
        config.channels = args
            .channels
            .iter()
            .map(|a| parse_channel_arg(a.as_str()))
            .collect::<Result<_, _>>()?;
    }
    if let Some(cooldown) = args.cooldown {
        for channel in &mut config.channels {
            channel.cooldown_secs = cooldown;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Parse `<id>=<policy>`
fn parse_channel_arg(arg: &str) -> Result<ChannelConfig, HandcueError> {
    let (id, policy) = arg
        .split_once('=')
        .ok_or_else(|| HandcueError::invalid_config(format!("expected ID=POLICY, got '{}'", arg)))?;
    let id: ChannelId = id.trim().parse().map_err(HandcueError::invalid_config)?;
    let policy = match policy.trim() {
        "edge-reset" => DebouncePolicy::EdgeReset,
        "time-based" => DebouncePolicy::TimeBased,
        other => {
            return Err(HandcueError::invalid_config(format!(
                "unknown policy '{}' (edge-reset | time-based)",
                other
            )))
        }
    };
    Ok(ChannelConfig::new(id, policy, DEFAULT_COOLDOWN_SECS))
}

fn parse_sound_channels(ids: &[String]) -> Result<Vec<ChannelId>, HandcueError> {
    if ids.is_empty() {
        return Ok(vec![ChannelId::FingerBent(FingerId::Index)]);
    }
    ids
        .iter()
        .map(|s| s.trim().parse::<ChannelId>().map_err(HandcueError::invalid_config))
        .collect()
}

/// Print header
fn print_header(args: &Args, config: &PipelineConfig, frames: usize) {
    println!();
    println!("{}", format!("Handcue v{} - finger state pipeline", VERSION).bold());
    println!("  Recording : {} ({} frames)", args.recording.display(), frames);
    println!(
        "  Mirror    : {} | min confidence {:.2} | bend ratio {:.2}",
        config.mirror_view, config.min_detection_confidence, config.geometry.bend_ratio
    );
    for channel in &config.channels {
        println!(
            "  Channel   : {} ({}, cooldown {:.1}s)",
            channel.id, channel.policy, channel.cooldown_secs
        );
    }
    if args.serve {
        println!("  Serving   : http://{}", args.addr);
    }
    println!();
}

/// Print run summary
fn print_summary(summary: &RunSummary, json: bool, no_color: bool) {
    if json {
        match serde_json::to_string(summary) {
            Ok(line) => println!("{}", line),
            Err(e) => debug!(error = %e, "run summary not serializable"),
        }
        return;
    }
    println!();
    if no_color {
        println!("{}", summary.to_parseable_string());
    } else {
        let exit = match summary.exit {
            RunExit::Exhausted => "recording finished".green(),
            RunExit::Stopped => "stopped".yellow(),
        };
        println!(
            "{} {} frames, {} classified, {} events ({})",
            "Done:".bold(),
            summary.frames,
            summary.classified,
            summary.events_fired,
            exit
        );
    }
}
