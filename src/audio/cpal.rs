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
use std::{error::Error, fmt, sync::Arc, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use super::mixer::ChannelMixer;
use super::{OutputFormat, SampleFormat};
use crate::samples::LoadedSample;

const DEFAULT_DEVICE: &str = "default";

/// A request for the audio callback to start a sample on a channel.
struct PlayCommand {
    channel: usize,
    data: Arc<Vec<f32>>,
    channel_count: u16,
}

/// Errors starting the output stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to build output stream with buffer_size {buffer_size} (try another audio.buffer_size): {source}")]
    Build {
        buffer_size: u32,
        #[source]
        source: cpal::BuildStreamError,
    },

    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// A cpal output device with a running stream. Play commands are handed to the
/// audio callback over a channel; the callback owns the mixer, so nothing on
/// the audio thread takes a lock.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host the device belongs to.
    host_id: cpal::HostId,
    /// The format of the output stream.
    format: OutputFormat,
    /// The number of playback channels.
    channel_count: usize,
    /// Sends play commands to the audio callback.
    commands: Sender<PlayCommand>,
    /// Dropping this stops the output thread and closes the stream.
    _shutdown: Sender<()>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) ({})",
            self.name,
            self.format,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists output devices across every available host.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        let mut devices: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let max_channels = match device.supported_output_configs() {
                    Ok(configs) => configs.map(|config| config.channels()).max().unwrap_or(0),
                    Err(_) => continue,
                };
                if max_channels == 0 {
                    continue;
                }

                devices.push(format!(
                    "{} (Channels={}) ({})",
                    device.name()?,
                    max_channels,
                    host_id.name()
                ));
            }
        }

        devices.sort();
        Ok(devices)
    }

    /// Finds the named output device. "default" is the default host's default output.
    fn find(name: &str) -> Result<(cpal::HostId, cpal::Device), Box<dyn Error>> {
        if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default output device found")?;
            return Ok((host.id(), device));
        }

        for host_id in cpal::available_hosts() {
            let devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };
            for device in devices {
                if device.name().is_ok_and(|n| n.trim() == name) {
                    return Ok((host_id, device));
                }
            }
        }

        Err(format!("no device found with name {}", name).into())
    }

    /// Opens the named device and starts its output stream.
    pub fn get(
        name: &str,
        format: OutputFormat,
        buffer_size: u32,
        channel_count: usize,
    ) -> Result<Device, Box<dyn Error>> {
        let (host_id, device) = Device::find(name)?;
        let device_name = device.name()?;

        let (commands, command_rx) = crossbeam_channel::unbounded();
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);

        let stream_config = cpal::StreamConfig {
            channels: format.channels,
            sample_rate: format.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(buffer_size),
        };
        let mixer = ChannelMixer::new(channel_count, format.channels);
        let sample_format = format.sample_format;
        let bits_per_sample = format.bits_per_sample;

        // cpal streams aren't Send on every platform, so the stream lives on its own thread.
        thread::spawn(move || {
            let span = span!(Level::INFO, "audio output");
            let _enter = span.enter();

            let stream = match (sample_format, bits_per_sample) {
                (SampleFormat::Float, _) => {
                    build_stream::<f32>(&device, &stream_config, mixer, command_rx)
                }
                (SampleFormat::Int, 16) => {
                    build_stream::<i16>(&device, &stream_config, mixer, command_rx)
                }
                (SampleFormat::Int, _) => {
                    build_stream::<i32>(&device, &stream_config, mixer, command_rx)
                }
            };
            let stream = match stream {
                Ok(stream) => stream,
                Err(source) => {
                    let err = StreamError::Build {
                        buffer_size,
                        source,
                    };
                    error!(err = err.to_string(), "Unable to open audio device");
                    let _ = started_tx.send(Err(err));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let err = StreamError::from(e);
                error!(err = err.to_string(), "Unable to open audio device");
                let _ = started_tx.send(Err(err));
                return;
            }
            let _ = started_tx.send(Ok(()));

            // Keep the stream alive until the device is dropped.
            let _ = shutdown_rx.recv();
            info!("Output stream closed");
        });

        match started_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err("output thread exited before starting the stream".into()),
        }

        info!(
            device = device_name,
            host = host_id.name(),
            format = %format,
            buffer_size,
            channels = channel_count,
            "Output stream started"
        );

        Ok(Device {
            name: device_name,
            host_id,
            format,
            channel_count,
            commands,
            _shutdown: shutdown,
        })
    }
}

/// Builds an output stream that drains play commands and mixes the channels
/// into the device's native sample type.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: ChannelMixer,
    commands: Receiver<PlayCommand>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(command) = commands.try_recv() {
                mixer.play(command.channel, command.data, command.channel_count);
            }

            if scratch.len() != data.len() {
                scratch.resize(data.len(), 0.0);
            }
            mixer.process_into_output(&mut scratch);

            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!(err = err.to_string(), "Output stream error"),
        None,
    )
}

impl super::Device for Device {
    fn play(&self, channel: usize, sample: &LoadedSample) -> Result<(), Box<dyn Error>> {
        if channel >= self.channel_count {
            return Err(format!("no channel {} on {}", channel, self.name).into());
        }
        if sample.sample_rate() != self.format.sample_rate
            || sample.channel_count() != self.format.channels
        {
            return Err(format!(
                "sample {} ({}Hz {}ch) doesn't match output format {}",
                sample.name(),
                sample.sample_rate(),
                sample.channel_count(),
                self.format
            )
            .into());
        }
        self.commands
            .send(PlayCommand {
                channel,
                data: sample.shared_data(),
                channel_count: sample.channel_count(),
            })
            .map_err(|_| format!("output stream for {} is closed", self.name))?;
        Ok(())
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn output_format(&self) -> &OutputFormat {
        &self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_names_buffer_size() {
        let err = StreamError::Build {
            buffer_size: 1024,
            source: cpal::BuildStreamError::StreamConfigNotSupported,
        };
        let message = err.to_string();
        assert!(message.contains("buffer_size 1024"), "{}", message);
        assert!(message.contains("audio.buffer_size"), "{}", message);
        assert!(err.source().is_some());
    }
}
