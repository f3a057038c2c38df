//! Audio device listing command.

use clap::{Args, Subcommand};
use passband_io::{CpalBackend, DeviceCatalog, DeviceInfo};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show backend and default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let catalog = DeviceCatalog::new(Box::new(CpalBackend::new()));

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = catalog.list_devices()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
                return Ok(());
            }
            print_device_table(&devices);
        }

        DevicesCommand::Info => {
            let info = catalog.host_info()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("Audio Host: {}", info.backend);
            println!("Devices: {}\n", info.device_count);
            print_default("Default Input", info.default_input.as_ref());
            print_default("Default Output", info.default_output.as_ref());
        }
    }

    Ok(())
}

/// Print devices with their selection ids.
pub fn print_device_table(devices: &[DeviceInfo]) {
    if devices.is_empty() {
        println!("No audio devices found.");
        return;
    }

    println!("Available Audio Devices");
    println!("=======================\n");
    println!("  {:>3}  {:<40} {:>4} {:>4} {:>8}", "id", "name", "in", "out", "rate");
    for device in devices {
        let mut marks = String::new();
        if device.is_default_input {
            marks.push_str(" [default in]");
        }
        if device.is_default_output {
            marks.push_str(" [default out]");
        }
        println!(
            "  {:>3}  {:<40} {:>4} {:>4} {:>8}{}",
            device.id,
            truncate(&device.name, 40),
            device.max_inputs,
            device.max_outputs,
            device.default_sample_rate,
            marks
        );
    }

    let inputs = devices.iter().filter(|d| d.has_input()).count();
    let outputs = devices.iter().filter(|d| d.has_output()).count();
    println!("\nTotal: {inputs} input(s), {outputs} output(s)");
    println!("\nTip: pass ids to the run command:");
    println!("  passband run --input 0 --output 1");
}

fn print_default(label: &str, device: Option<&DeviceInfo>) {
    match device {
        Some(device) => {
            println!("{label}:");
            println!("  Id: {}", device.id);
            println!("  Name: {}", device.name);
            println!("  Sample Rate: {} Hz", device.default_sample_rate);
            println!();
        }
        None => {
            println!("{label}: None");
            println!();
        }
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut out: String = name.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
