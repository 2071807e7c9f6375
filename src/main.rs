// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use stairs::audio;
use stairs::config::{self, Stairs};
use stairs::dispatch::Dispatcher;
use stairs::input;
use stairs::samples::SampleBank;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Plays piano notes for a pressure-sensor staircase."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will load the samples and play a note for every step.
    Start {
        /// The path to the stairs config.
        config_path: String,
        /// Read step events from standard input instead of the configured input.
        #[arg(short, long)]
        debug: bool,
    },
    /// Verifies the config and that every sample loads.
    Verify {
        /// The path to the stairs config.
        config_path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available serial ports.
    SerialPorts {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path, debug } => {
            let mut stairs = Stairs::deserialize(&PathBuf::from(&config_path))?;
            if debug {
                stairs.set_input(config::Input::Stdin);
            }

            let device = audio::get_device(stairs.audio(), stairs.channels())?;
            info!(device = device.to_string(), "Audio device ready.");

            let bank = Arc::new(SampleBank::load(&stairs, device.output_format())?);
            let mut source = input::open(stairs.input())?;

            let dispatcher = Dispatcher::new(bank, device);
            dispatcher.run(source.as_mut(), stairs.warmup()?)?;
        }
        Commands::Verify { config_path } => {
            let stairs = Stairs::deserialize(&PathBuf::from(&config_path))?;
            let device = audio::get_device(&stairs.audio().with_device("mock"), stairs.channels())?;
            let bank = Arc::new(SampleBank::load(&stairs, device.output_format())?);
            let dispatcher = Dispatcher::new(bank.clone(), device.clone());

            println!(
                "Samples (count: {}, channels: {}, format: {}):",
                bank.len(),
                device.channel_count(),
                device.output_format()
            );
            for (index, sample) in bank.iter() {
                let path = bank.path(index).map(|path| path.display().to_string());
                println!(
                    "- {:>3} -> channel {} {} ({:.2}s)",
                    index,
                    dispatcher.channel_for(index),
                    path.unwrap_or_default(),
                    sample.duration().as_secs_f64()
                );
            }
            println!(
                "\nMemory usage: {:.1} MiB",
                bank.memory_usage() as f64 / (1024.0 * 1024.0)
            );
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices.iter() {
                println!("- {}", device);
            }
        }
        Commands::SerialPorts {} => {
            let ports = input::serial::list_ports()?;

            if ports.is_empty() {
                println!("No serial ports found.");
                return Ok(());
            }

            println!("Serial ports:");
            for port in ports.iter() {
                println!("- {}", port);
            }
        }
    }

    Ok(())
}
