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
use std::io;

use tracing::info;

use crate::config::{self, ConfigError};

pub mod reader;
pub mod serial;

pub use reader::LineReader;

/// A lazy sequence of text lines, each one a candidate step event.
pub trait LineSource: Send {
    /// Blocks until the next line is available. Returns `Ok(None)` once the
    /// source has ended; a source that times out returns an empty line instead.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Errors opening an input source. These are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Opens the configured input source.
pub fn open(config: &config::Input) -> Result<Box<dyn LineSource>, InputError> {
    match config {
        config::Input::Serial(serial) => Ok(Box::new(serial::open(serial)?)),
        config::Input::Stdin => {
            info!("Reading events from standard input");
            Ok(Box::new(LineReader::new(io::stdin())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_serial_port() {
        let config = config::Input::Serial(config::Serial::new("/dev/stairs-does-not-exist"));
        match open(&config) {
            Err(InputError::Open { port, .. }) => assert_eq!(port, "/dev/stairs-does-not-exist"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected the port to be missing"),
        }
    }
}
