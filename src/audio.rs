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
use std::{error::Error, fmt, sync::Arc};

use crate::config;
use crate::samples::LoadedSample;

pub mod cpal;
pub mod format;
pub mod mixer;
pub mod mock;

pub use format::{OutputFormat, SampleFormat};

/// An audio output with a fixed pool of playback channels.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Starts playing the sample on the given channel, replacing whatever that
    /// channel was playing. Returns without waiting for playback to finish.
    fn play(&self, channel: usize, sample: &LoadedSample) -> Result<(), Box<dyn Error>>;

    /// Returns the number of playback channels.
    fn channel_count(&self) -> usize;

    /// Returns the format samples must be converted to before playing.
    fn output_format(&self) -> &OutputFormat;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the config with the given number of playback channels.
/// Devices whose name starts with "mock" are mocks that play nothing.
pub fn get_device(
    config: &config::Audio,
    channel_count: usize,
) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let format = config.output_format()?;
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device, channel_count, format)));
    };

    Ok(Arc::new(cpal::Device::get(
        device,
        format,
        config.buffer_size(),
        channel_count,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mock_device() {
        let device = get_device(&config::Audio::default().with_device("mock-device"), 7).unwrap();
        assert_eq!(device.channel_count(), 7);
        assert_eq!(device.output_format(), &OutputFormat::default());
        assert_eq!(device.to_string(), "mock-device (Mock)");
    }

    #[test]
    fn test_mock_device_records_plays() {
        let device = mock::Device::get("mock", 7, OutputFormat::default());
        let sample = LoadedSample::new("03-c4", vec![0.0; 10], 1, 44100);

        Device::play(&device, 3, &sample).unwrap();
        Device::play(&device, 3, &sample).unwrap();
        assert!(Device::play(&device, 7, &sample).is_err());

        let expected = mock::Play {
            channel: 3,
            sample: "03-c4".to_string(),
        };
        assert_eq!(device.plays(), vec![expected.clone(), expected]);
    }
}
