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
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use super::input::Input;
use super::parse_duration;

/// Note name fragments, one per step, bottom step first.
pub const DEFAULT_NOTES: [&str; 27] = [
    "00-g3", "01-a3", "02-b3", "03-c4", "04-d4", "05-e4", "06-f-4", "07-g4", "08-a3", "09-b3",
    "10-c4", "11-d4", "12-e4", "13-f-4", "14-g3", "15-a3", "16-b3", "17-c4", "18-d4", "19-e4",
    "20-f-4", "21-g4", "22-a3", "23-b3", "24-c4", "25-d4", "26-e4",
];

/// Default number of playback channels.
pub const DEFAULT_CHANNELS: usize = 7;

const DEFAULT_EXTENSION: &str = "wav";
const DEFAULT_WARMUP: Duration = Duration::from_secs(3);

/// The configuration for the stairs installation.
#[derive(Deserialize, Clone, Debug)]
pub struct Stairs {
    /// The directory holding one sample file per note.
    samples_dir: PathBuf,

    /// The sample file extension.
    extension: Option<String>,

    /// Reverses the note table, for sensors wired top-to-bottom.
    #[serde(default)]
    reverse_notes: bool,

    /// The note name fragments, indexed by sensor.
    notes: Option<Vec<String>>,

    /// The number of playback channels.
    channels: Option<usize>,

    /// How long to wait for attached hardware before reading events.
    warmup: Option<String>,

    /// Where events are read from.
    #[serde(default)]
    input: Input,

    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,
}

impl Stairs {
    /// Creates a configuration for the given samples directory with default settings.
    pub fn new(samples_dir: &Path) -> Stairs {
        Stairs {
            samples_dir: samples_dir.to_path_buf(),
            extension: None,
            reverse_notes: false,
            notes: None,
            channels: None,
            warmup: None,
            input: Input::default(),
            audio: Audio::default(),
        }
    }

    /// Parses and validates the configuration from a YAML file. A relative samples
    /// directory is resolved against the directory containing the file.
    pub fn deserialize(path: &Path) -> Result<Stairs, ConfigError> {
        let mut stairs = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Stairs>()?;

        if stairs.samples_dir.is_relative() {
            if let Some(parent) = path.parent() {
                stairs.samples_dir = parent.join(&stairs.samples_dir);
            }
        }

        stairs.validate()?;
        Ok(stairs)
    }

    /// Checks invariants that serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels() == 0 {
            return Err(ConfigError::Invalid(
                "channels must be at least 1".to_string(),
            ));
        }
        if self.notes.as_ref().is_some_and(|notes| notes.is_empty()) {
            return Err(ConfigError::Invalid(
                "notes must contain at least one entry".to_string(),
            ));
        }
        self.warmup()?;
        self.audio.output_format()?;
        if let Input::Serial(serial) = &self.input {
            serial.timeout()?;
        }
        Ok(())
    }

    /// Returns the samples directory.
    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    /// Returns the sample file extension (default: wav).
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Returns the note table in sensor order, reversed if configured.
    pub fn notes(&self) -> Vec<String> {
        let mut notes: Vec<String> = match &self.notes {
            Some(notes) => notes.clone(),
            None => DEFAULT_NOTES.iter().map(|note| note.to_string()).collect(),
        };
        if self.reverse_notes {
            notes.reverse();
        }
        notes
    }

    /// Returns the sample file path for each sensor index.
    pub fn sample_paths(&self) -> Vec<PathBuf> {
        self.notes()
            .iter()
            .map(|note| {
                self.samples_dir
                    .join(format!("{}.{}", note, self.extension()))
            })
            .collect()
    }

    /// Returns the number of playback channels (default: 7).
    pub fn channels(&self) -> usize {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    /// Returns the warm-up delay (default: 3s).
    pub fn warmup(&self) -> Result<Duration, ConfigError> {
        match &self.warmup {
            Some(warmup) => parse_duration(warmup),
            None => Ok(DEFAULT_WARMUP),
        }
    }

    /// Returns the input configuration.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Replaces the input configuration.
    pub fn set_input(&mut self, input: Input) {
        self.input = input;
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use config::FileFormat;

    use super::*;

    fn parse(yaml: &str) -> Stairs {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let stairs = parse("samples_dir: /srv/samples");

        assert_eq!(stairs.samples_dir(), Path::new("/srv/samples"));
        assert_eq!(stairs.extension(), "wav");
        assert_eq!(stairs.channels(), 7);
        assert_eq!(stairs.warmup().unwrap(), Duration::from_secs(3));
        assert_eq!(stairs.notes().len(), 27);
        assert!(matches!(stairs.input(), Input::Serial(_)));
        assert_eq!(stairs.audio().device(), "default");
        assert!(stairs.validate().is_ok());
    }

    #[test]
    fn test_sample_paths() {
        let stairs = parse(
            r#"
            samples_dir: /srv/samples
            extension: flac
            notes: [c4, d4, e4]
        "#,
        );

        assert_eq!(
            stairs.sample_paths(),
            vec![
                PathBuf::from("/srv/samples/c4.flac"),
                PathBuf::from("/srv/samples/d4.flac"),
                PathBuf::from("/srv/samples/e4.flac"),
            ]
        );
    }

    #[test]
    fn test_default_paths_follow_note_table() {
        let paths = Stairs::new(Path::new("/srv/samples")).sample_paths();
        assert_eq!(paths[0], PathBuf::from("/srv/samples/00-g3.wav"));
        assert_eq!(paths[6], PathBuf::from("/srv/samples/06-f-4.wav"));
        assert_eq!(paths[26], PathBuf::from("/srv/samples/26-e4.wav"));
    }

    #[test]
    fn test_reverse_notes() {
        let stairs = parse(
            r#"
            samples_dir: /srv/samples
            reverse_notes: true
            notes: [c4, d4, e4]
        "#,
        );

        assert_eq!(stairs.notes(), vec!["e4", "d4", "c4"]);
    }

    #[test]
    fn test_zero_channels_rejected() {
        let stairs = parse(
            r#"
            samples_dir: /srv/samples
            channels: 0
        "#,
        );
        assert!(matches!(stairs.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_notes_rejected() {
        let stairs = parse(
            r#"
            samples_dir: /srv/samples
            notes: []
        "#,
        );
        assert!(matches!(stairs.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_warmup_rejected() {
        let stairs = parse(
            r#"
            samples_dir: /srv/samples
            warmup: whenever
        "#,
        );
        assert!(matches!(
            stairs.validate(),
            Err(ConfigError::Duration { .. })
        ));
    }

    #[test]
    fn test_deserialize_resolves_relative_samples_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stairs.yaml");
        fs::write(
            &path,
            r#"
samples_dir: samples
warmup: 0s
input:
  kind: stdin
audio:
  device: mock-device
"#,
        )
        .unwrap();

        let stairs = Stairs::deserialize(&path).unwrap();
        assert_eq!(stairs.samples_dir(), dir.path().join("samples"));
        assert_eq!(stairs.warmup().unwrap(), Duration::ZERO);
        assert!(matches!(stairs.input(), Input::Stdin));
        assert_eq!(stairs.audio().device(), "mock-device");
    }

    #[test]
    fn test_deserialize_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Stairs::deserialize(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
