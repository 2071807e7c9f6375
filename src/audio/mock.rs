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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::debug;

use super::OutputFormat;
use crate::samples::LoadedSample;

/// A play command recorded by the mock device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Play {
    /// The channel the sample was started on.
    pub channel: usize,
    /// The note name of the sample.
    pub sample: String,
}

/// A mock device. Doesn't actually play anything, just records what it was told to play.
#[derive(Clone)]
pub struct Device {
    name: String,
    channel_count: usize,
    format: OutputFormat,
    plays: Arc<Mutex<Vec<Play>>>,
    failing: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, channel_count: usize, format: OutputFormat) -> Device {
        Device {
            name: name.to_string(),
            channel_count,
            format,
            plays: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns every play command received so far.
    pub fn plays(&self) -> Vec<Play> {
        self.plays.lock().clone()
    }

    /// When set, play commands return an error instead of being recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl super::Device for Device {
    fn play(&self, channel: usize, sample: &LoadedSample) -> Result<(), Box<dyn Error>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(format!("{} is failing", self.name).into());
        }
        if channel >= self.channel_count {
            return Err(format!("no channel {} on {}", channel, self.name).into());
        }

        debug!(device = self.name, channel, sample = sample.name(), "Playing sample.");
        self.plays.lock().push(Play {
            channel,
            sample: sample.name().to_string(),
        });
        Ok(())
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn output_format(&self) -> &OutputFormat {
        &self.format
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
