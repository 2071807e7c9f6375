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
use std::time::Duration;

use serde::Deserialize;

use super::error::ConfigError;
use super::parse_duration;

const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";
const DEFAULT_BAUD_RATE: u32 = 115_200;
const DEFAULT_SERIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Where step events are read from.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Input {
    /// A microcontroller attached over a serial line.
    Serial(Serial),
    /// Interactive standard input, for debugging without hardware.
    Stdin,
}

impl Default for Input {
    fn default() -> Self {
        Input::Serial(Serial::default())
    }
}

/// The serial line configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Serial {
    /// The serial port path or name.
    port: Option<String>,
    /// The baud rate of the line.
    baud_rate: Option<u32>,
    /// How long a read may block before yielding an empty line.
    timeout: Option<String>,
}

impl Serial {
    /// Creates a serial configuration for the given port with default settings.
    #[cfg(test)]
    pub fn new(port: &str) -> Serial {
        Serial {
            port: Some(port.to_string()),
            ..Default::default()
        }
    }

    /// Returns the serial port (default: /dev/ttyACM0).
    pub fn port(&self) -> &str {
        self.port.as_deref().unwrap_or(DEFAULT_SERIAL_PORT)
    }

    /// Returns the baud rate (default: 115200).
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    /// Returns the read timeout (default: 1s).
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match &self.timeout {
            Some(timeout) => parse_duration(timeout),
            None => Ok(DEFAULT_SERIAL_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Input {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_serial_input() {
        let input = parse(
            r#"
            kind: serial
            port: /dev/ttyUSB0
            baud_rate: 9600
            timeout: 250ms
        "#,
        );

        match input {
            Input::Serial(serial) => {
                assert_eq!(serial.port(), "/dev/ttyUSB0");
                assert_eq!(serial.baud_rate(), 9600);
                assert_eq!(serial.timeout().unwrap(), Duration::from_millis(250));
            }
            Input::Stdin => panic!("expected serial input"),
        }
    }

    #[test]
    fn test_serial_defaults() {
        match parse("kind: serial") {
            Input::Serial(serial) => {
                assert_eq!(serial.port(), "/dev/ttyACM0");
                assert_eq!(serial.baud_rate(), 115_200);
                assert_eq!(serial.timeout().unwrap(), Duration::from_secs(1));
            }
            Input::Stdin => panic!("expected serial input"),
        }
    }

    #[test]
    fn test_stdin_input() {
        assert!(matches!(parse("kind: stdin"), Input::Stdin));
    }

    #[test]
    fn test_bad_timeout() {
        let serial = Serial {
            timeout: Some("soon".to_string()),
            ..Serial::new("/dev/null")
        };
        assert!(matches!(
            serial.timeout(),
            Err(ConfigError::Duration { .. })
        ));
    }
}
