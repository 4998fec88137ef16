/*
 *  display/transport/linux.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Linux spidev + GPIO character device transport
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::io::Write;

use embedded_hal::digital::OutputPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use linux_embedded_hal::CdevPin;
use log::{debug, info};

use crate::display::error::TransportError;
use crate::display::transport::{Level, PanelTransport, DEFAULT_MAX_TRANSFER};

const CONSUMER: &str = "spipanel";

/// spidev bus with GPIO lines requested lazily from one gpiochip
///
/// Lines are requested as outputs the first time they are driven and
/// given back to the kernel on [`PanelTransport::release_line`] or drop.
pub struct LinuxTransport {
    spi: Spidev,
    chip: Chip,
    lines: HashMap<u32, CdevPin>,
    max_transfer: usize,
}

impl LinuxTransport {
    /// Open a spidev node (e.g. "/dev/spidev0.0") and a gpiochip
    /// (e.g. "/dev/gpiochip0"), SPI mode 0, 8-bit words, MSB first
    pub fn open(
        spi_path: &str,
        gpiochip_path: &str,
        speed_hz: u32,
        max_transfer: Option<usize>,
    ) -> Result<Self, TransportError> {
        info!("Opening SPI {} and GPIO {}", spi_path, gpiochip_path);

        let spi = Spidev::open(spi_path)
            .map_err(|e| TransportError::Configure(format!("Failed to open {}: {}", spi_path, e)))?;
        let chip = Chip::new(gpiochip_path)
            .map_err(|e| TransportError::Configure(format!("Failed to open {}: {}", gpiochip_path, e)))?;

        let mut transport = Self {
            spi,
            chip,
            lines: HashMap::new(),
            max_transfer: max_transfer.unwrap_or(DEFAULT_MAX_TRANSFER).max(1),
        };
        transport.configure(speed_hz)?;
        Ok(transport)
    }

    fn request_line(&mut self, pin: u32, level: Level) -> Result<(), TransportError> {
        let line_err = |e: &dyn std::fmt::Display| TransportError::Line { pin, message: e.to_string() };

        let handle = self
            .chip
            .get_line(pin)
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, (level == Level::High) as u8, CONSUMER))
            .map_err(|e| line_err(&e))?;
        let line = CdevPin::new(handle).map_err(|e| line_err(&e))?;

        debug!("Requested GPIO line {} as output", pin);
        self.lines.insert(pin, line);
        Ok(())
    }
}

impl PanelTransport for LinuxTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.spi
            .write_all(bytes)
            .map_err(|e| TransportError::Bus(e.to_string()))
    }

    fn set_line(&mut self, pin: u32, level: Level) -> Result<(), TransportError> {
        let Some(line) = self.lines.get_mut(&pin) else {
            // requesting the line applies the initial level
            return self.request_line(pin, level);
        };

        let result = match level {
            Level::High => line.set_high(),
            Level::Low => line.set_low(),
        };
        result.map_err(|e| TransportError::Line { pin, message: format!("{:?}", e) })
    }

    fn configure(&mut self, baudrate: u32) -> Result<(), TransportError> {
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(baudrate)
            .lsb_first(false)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        self.spi
            .configure(&options)
            .map_err(|e| TransportError::Configure(e.to_string()))?;
        debug!("SPI clock set to {} Hz", baudrate);
        Ok(())
    }

    fn release_line(&mut self, pin: u32) -> Result<(), TransportError> {
        if self.lines.remove(&pin).is_some() {
            debug!("Released GPIO line {}", pin);
        }
        Ok(())
    }

    fn max_transfer_len(&self) -> usize {
        self.max_transfer
    }
}
