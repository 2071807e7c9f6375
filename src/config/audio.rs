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
use std::str::FromStr;

use serde::Deserialize;

use super::error::ConfigError;
use crate::audio::{OutputFormat, SampleFormat};

const DEFAULT_DEVICE: &str = "default";
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_OUTPUT_CHANNELS: u16 = 1;
const DEFAULT_BITS_PER_SAMPLE: u16 = 16;
const DEFAULT_BUFFER_SIZE: u32 = 1024;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Audio {
    /// The audio device. "default" picks the host's default output device.
    device: Option<String>,

    /// Output sample rate in Hz (default: 44100).
    sample_rate: Option<u32>,

    /// Number of output channels (default: 1, mono).
    output_channels: Option<u16>,

    /// Output sample format, "int" or "float" (default: "int").
    sample_format: Option<String>,

    /// Output bits per sample (default: 16).
    bits_per_sample: Option<u16>,

    /// Stream buffer size in frames (default: 1024).
    buffer_size: Option<u32>,
}

impl Audio {
    /// Returns a copy of this configuration that outputs to the given device.
    pub fn with_device(&self, device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..self.clone()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the output sample rate (default: 44100).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the number of output channels (default: 1).
    pub fn output_channels(&self) -> u16 {
        self.output_channels.unwrap_or(DEFAULT_OUTPUT_CHANNELS)
    }

    /// Returns the output sample format (default: Int).
    pub fn sample_format(&self) -> Result<SampleFormat, ConfigError> {
        match self.sample_format.as_deref() {
            Some(format) => SampleFormat::from_str(format)
                .map_err(|e| ConfigError::SampleFormat(e.to_string())),
            None => Ok(SampleFormat::Int),
        }
    }

    /// Returns the output bits per sample (default: 16).
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample.unwrap_or(DEFAULT_BITS_PER_SAMPLE)
    }

    /// Returns the stream buffer size in frames (default: 1024).
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }

    /// Builds the validated output format described by this configuration.
    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        OutputFormat::new(
            self.sample_rate(),
            self.output_channels(),
            self.sample_format()?,
            self.bits_per_sample(),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Audio {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_audio_defaults() {
        let audio = Audio::default();
        assert_eq!(audio.device(), "default");
        assert_eq!(audio.sample_rate(), 44100);
        assert_eq!(audio.output_channels(), 1);
        assert_eq!(audio.sample_format().unwrap(), SampleFormat::Int);
        assert_eq!(audio.bits_per_sample(), 16);
        assert_eq!(audio.buffer_size(), 1024);
    }

    #[test]
    fn test_audio_deserialize() {
        let audio = parse(
            r#"
            device: USB Audio
            sample_rate: 48000
            output_channels: 2
            sample_format: float
            bits_per_sample: 32
            buffer_size: 256
        "#,
        );

        assert_eq!(audio.device(), "USB Audio");
        let format = audio.output_format().unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_format, SampleFormat::Float);
        assert_eq!(format.bits_per_sample, 32);
        assert_eq!(audio.buffer_size(), 256);
    }

    #[test]
    fn test_with_device_keeps_format() {
        let audio = parse("device: USB Audio\nsample_rate: 48000\noutput_channels: 2");
        let mock = audio.with_device("mock");

        assert_eq!(mock.device(), "mock");
        assert_eq!(mock.output_format().unwrap(), audio.output_format().unwrap());
        assert_eq!(audio.device(), "USB Audio");
    }

    #[test]
    fn test_audio_invalid_sample_format() {
        let audio = parse("sample_format: double");
        assert!(matches!(
            audio.sample_format(),
            Err(ConfigError::SampleFormat(_))
        ));
    }

    #[test]
    fn test_audio_unsupported_bit_depth() {
        let audio = parse("bits_per_sample: 24");
        assert!(matches!(audio.output_format(), Err(ConfigError::Invalid(_))));
    }
}
