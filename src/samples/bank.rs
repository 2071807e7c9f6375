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

//! The sample bank: one decoded sample per step, indexed by sensor.

use std::path::{Path, PathBuf};

use tracing::info;

use super::error::SampleError;
use super::loader::{LoadedSample, SampleLoader};
use crate::audio::OutputFormat;
use crate::config::Stairs;

/// A bank entry: the file a sample was loaded from and its decoded data.
struct Entry {
    path: PathBuf,
    sample: LoadedSample,
}

/// An immutable, ordered set of samples. Index `i` holds the sample for sensor `i`.
pub struct SampleBank {
    entries: Vec<Entry>,
}

impl SampleBank {
    /// Loads every sample named by the configuration's note table, converting
    /// each to the given output format. Any missing or undecodable file fails
    /// the whole load.
    pub fn load(config: &Stairs, format: &OutputFormat) -> Result<SampleBank, SampleError> {
        let files = config.notes().into_iter().zip(config.sample_paths());
        Self::load_files(files, format)
    }

    /// Loads the given (note name, path) pairs in order.
    pub fn load_files<I>(files: I, format: &OutputFormat) -> Result<SampleBank, SampleError>
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let mut loader = SampleLoader::new(format.clone());
        let mut entries = Vec::new();

        for (name, path) in files {
            let sample = loader.load(&name, &path)?;
            entries.push(Entry { path, sample });
        }

        info!(
            samples = entries.len(),
            memory_kb = loader.total_memory_usage() / 1024,
            format = %format,
            "Sample bank loaded"
        );

        Ok(SampleBank { entries })
    }

    /// Builds a bank from already decoded samples.
    #[cfg(test)]
    pub fn from_samples(samples: Vec<(PathBuf, LoadedSample)>) -> SampleBank {
        SampleBank {
            entries: samples
                .into_iter()
                .map(|(path, sample)| Entry { path, sample })
                .collect(),
        }
    }

    /// Returns the sample for the given sensor index, if there is one.
    pub fn get(&self, index: usize) -> Option<&LoadedSample> {
        self.entries.get(index).map(|entry| &entry.sample)
    }

    /// Returns the file the sample at the given index was loaded from.
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(|entry| entry.path.as_path())
    }

    /// Returns the number of samples, which is the number of sensors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over (index, sample) in sensor order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LoadedSample)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, &entry.sample))
    }

    /// Returns the memory held by the bank. Samples loaded from the same
    /// file share data and are counted once per entry.
    pub fn memory_usage(&self) -> usize {
        self.entries.iter().map(|e| e.sample.memory_size()).sum()
    }
}

impl std::fmt::Debug for SampleBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBank")
            .field("samples", &self.entries.len())
            .field("memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}
