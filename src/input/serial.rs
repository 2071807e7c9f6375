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

use tracing::info;

use super::reader::LineReader;
use super::InputError;
use crate::config;

/// Opens the configured serial port and returns a line reader over it.
pub fn open(
    config: &config::Serial,
) -> Result<LineReader<Box<dyn serialport::SerialPort>>, InputError> {
    let timeout = config.timeout()?;
    let port = serialport::new(config.port(), config.baud_rate())
        .timeout(timeout)
        .open()
        .map_err(|source| InputError::Open {
            port: config.port().to_string(),
            source,
        })?;

    info!(
        port = config.port(),
        baud_rate = config.baud_rate(),
        timeout_ms = timeout.as_millis(),
        "Serial port opened"
    );

    Ok(LineReader::new(port))
}

/// Lists the serial ports present on the system.
pub fn list_ports() -> Result<Vec<String>, Box<dyn Error>> {
    let mut ports: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|port| match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => format!(
                "{} (USB {:04x}:{:04x}{})",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product
                    .map(|product| format!(" {}", product))
                    .unwrap_or_default()
            ),
            serialport::SerialPortType::PciPort => format!("{} (PCI)", port.port_name),
            serialport::SerialPortType::BluetoothPort => {
                format!("{} (Bluetooth)", port.port_name)
            }
            serialport::SerialPortType::Unknown => port.port_name,
        })
        .collect();
    ports.sort();
    Ok(ports)
}
