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
//! Turns step events into note playback.

use std::{fmt, io, sync::Arc, thread, time::Duration};

use tracing::{debug, error, info, span, trace, Level};

use crate::audio::Device;
use crate::input::LineSource;
use crate::samples::SampleBank;

/// Why an event was dropped without playing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The line was empty, usually a read timeout.
    Empty,
    /// The line wasn't a non-negative base-10 integer.
    NotANumber(String),
    /// The index has no sample.
    OutOfRange(u64),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Empty => write!(f, "empty line"),
            DropReason::NotANumber(line) => write!(f, "not a sensor index: {:?}", line),
            DropReason::OutOfRange(index) => write!(f, "sensor index {} out of range", index),
        }
    }
}

/// The result of dispatching a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Played { index: usize, channel: usize },
    Dropped(DropReason),
}

/// Dispatches step events to the sample bank and audio device.
pub struct Dispatcher {
    bank: Arc<SampleBank>,
    device: Arc<dyn Device>,
    channel_count: usize,
}

impl Dispatcher {
    /// Creates a dispatcher that rotates over the device's channels.
    pub fn new(bank: Arc<SampleBank>, device: Arc<dyn Device>) -> Dispatcher {
        let channel_count = device.channel_count().max(1);
        Dispatcher {
            bank,
            device,
            channel_count,
        }
    }

    /// Returns the channel a sensor index plays on.
    pub fn channel_for(&self, index: usize) -> usize {
        index % self.channel_count
    }

    /// Handles a single raw line. Bad input is dropped and never an error.
    pub fn dispatch(&self, line: &str) -> Outcome {
        let line = line.trim();
        if line.is_empty() {
            trace!("Empty line.");
            return Outcome::Dropped(DropReason::Empty);
        }

        let reason = match parse_index(line) {
            Some(index) => match usize::try_from(index)
                .ok()
                .and_then(|i| self.bank.get(i).map(|sample| (i, sample)))
            {
                Some((index, sample)) => {
                    let channel = self.channel_for(index);
                    if let Err(e) = self.device.play(channel, sample) {
                        error!(
                            err = e.as_ref(),
                            index,
                            channel,
                            sample = sample.name(),
                            "Error playing sample."
                        );
                    }
                    return Outcome::Played { index, channel };
                }
                None => DropReason::OutOfRange(index),
            },
            None => DropReason::NotANumber(line.to_string()),
        };

        debug!(reason = %reason, "Dropped event.");
        Outcome::Dropped(reason)
    }

    /// Waits out the warmup, then dispatches lines until the source ends.
    /// A read error ends the loop and is returned.
    pub fn run(&self, source: &mut dyn LineSource, warmup: Duration) -> Result<(), io::Error> {
        let span = span!(Level::INFO, "dispatch");
        let _enter = span.enter();

        if !warmup.is_zero() {
            info!(warmup_ms = warmup.as_millis(), "Warming up.");
            thread::sleep(warmup);
        }

        info!(
            samples = self.bank.len(),
            channels = self.channel_count,
            device = self.device.to_string(),
            "Listening for steps."
        );

        while let Some(line) = source.read_line()? {
            if let Outcome::Played { index, channel } = self.dispatch(&line) {
                debug!(index, channel, "Played step.");
            }
        }

        info!("Input ended.");
        Ok(())
    }
}

/// Parses an unsigned base-10 index. Signs are rejected.
fn parse_index(line: &str) -> Option<u64> {
    if !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse().ok()
}
