//! Real-time filtering command with an interactive console.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use clap::Args;
use passband_config::EngineConfig;
use passband_core::linear_to_db;
use passband_io::{AudioEngine, CpalBackend, DeviceId};

use crate::commands::devices::print_device_table;
use crate::console::{ConsoleCommand, Usage};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    /// Input device id (see `passband devices`). Defaults to the host's default input.
    #[arg(short, long)]
    input: Option<DeviceId>,

    /// Output device id. Defaults to the host's default output.
    #[arg(short, long)]
    output: Option<DeviceId>,

    /// Buffer size in frames
    #[arg(short, long)]
    buffer_size: Option<u32>,

    /// Center frequency in Hz
    #[arg(long)]
    center: Option<f32>,

    /// Bandwidth in Hz
    #[arg(long)]
    bandwidth: Option<f32>,

    /// Configuration file (TOML). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Select devices but do not start audio until `start` is entered
    #[arg(long)]
    paused: bool,

    /// Run without the stdin console until Ctrl+C
    #[arg(long)]
    no_console: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let (mut config, source) = EngineConfig::load_or_default(args.config.as_deref())?;
    if let Some(path) = &source {
        tracing::info!(path = %path.display(), "loaded configuration");
    }
    apply_overrides(&mut config, &args);
    config.validate()?;

    let mut engine = AudioEngine::with_settings(
        Box::new(CpalBackend::new()),
        config.filter_parameters(),
        config.chain_settings(),
    );

    let host = engine.host_info()?;
    let input = args
        .input
        .or(host.default_input.as_ref().map(|d| d.id))
        .ok_or_else(|| anyhow::anyhow!("no input device given and the host has no default"))?;
    let output = args
        .output
        .or(host.default_output.as_ref().map(|d| d.id))
        .ok_or_else(|| anyhow::anyhow!("no output device given and the host has no default"))?;

    let stream = engine.select_devices(input, output, config.stream.buffer_size)?;
    let params = engine.parameters();
    println!("Real-time bandpass on {}", host.backend);
    println!("  Input:  {}", stream.input_device);
    println!("  Output: {}", stream.output_device);
    println!("  Sample rate: {} Hz", stream.sample_rate);
    println!("  Buffer size: {} frames", stream.buffer_size);
    println!(
        "  Band: {} Hz center, {} Hz wide",
        params.center_freq, params.bandwidth
    );
    let settings = config.chain_settings();
    println!(
        "  Gain: {:+.1} dB in, {:+.1} dB out, ceiling {:.1} dBFS",
        linear_to_db(settings.pre_gain),
        linear_to_db(settings.post_gain),
        linear_to_db(settings.ceiling)
    );

    if !args.paused {
        engine.start()?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    if args.no_console {
        println!("\nPress Ctrl+C to stop...\n");
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(POLL_INTERVAL);
        }
    } else {
        println!("\nType 'help' for commands, 'quit' or Ctrl+C to stop.\n");
        console_loop(&mut engine, &running, config.stream.buffer_size);
    }

    println!("Stopping...");
    engine.close();
    Ok(())
}

fn apply_overrides(config: &mut EngineConfig, args: &RunArgs) {
    if let Some(center) = args.center {
        config.filter.center_freq = center;
    }
    if let Some(bandwidth) = args.bandwidth {
        config.filter.bandwidth = bandwidth;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.stream.buffer_size = buffer_size;
    }
}

/// Read commands from stdin until `quit`, end of input, or Ctrl+C.
fn console_loop(engine: &mut AudioEngine, running: &AtomicBool, mut buffer_size: u32) {
    // stdin blocks, so lines arrive over a channel and the loop polls `running`.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read console input");
                    break;
                }
            }
        }
    });

    while running.load(Ordering::SeqCst) {
        let line = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        if command == ConsoleCommand::Quit {
            break;
        }
        if let Err(e) = execute(engine, command, &mut buffer_size) {
            println!("error: {e}");
        }
    }
}

fn execute(
    engine: &mut AudioEngine,
    command: ConsoleCommand,
    buffer_size: &mut u32,
) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Center(hz) => report(engine.update_parameters(Some(hz), None)?),
        ConsoleCommand::Bandwidth(hz) => report(engine.update_parameters(None, Some(hz))?),
        ConsoleCommand::Set { center, bandwidth } => {
            report(engine.update_parameters(Some(center), Some(bandwidth))?)
        }
        ConsoleCommand::Start => {
            engine.start()?;
            println!("running");
        }
        ConsoleCommand::Stop => {
            engine.stop()?;
            println!("stopped");
        }
        ConsoleCommand::Status => {
            println!("{}", serde_json::to_string_pretty(&engine.status())?);
        }
        ConsoleCommand::Devices => print_device_table(&engine.list_devices()?),
        ConsoleCommand::Select {
            input,
            output,
            buffer_size: requested,
        } => {
            let frames = requested.unwrap_or(*buffer_size);
            let stream = engine.select_devices(input, output, frames)?;
            *buffer_size = stream.buffer_size;
            println!(
                "selected {} -> {} at {} Hz, {} frames (enter 'start' to resume)",
                stream.input_device, stream.output_device, stream.sample_rate, stream.buffer_size
            );
        }
        ConsoleCommand::Help => println!("{Usage}"),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn report(params: passband_core::FilterParameters) {
    let (low, high) = params.band_edges();
    println!(
        "center {} Hz, bandwidth {} Hz ({low:.1}-{high:.1} Hz)",
        params.center_freq, params.bandwidth
    );
}
