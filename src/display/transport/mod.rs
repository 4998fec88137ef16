/*
 *  display/transport/mod.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  SPI + GPIO transport consumed by the panel driver
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

#[cfg(feature = "linux")]
pub mod linux;

// Recording transport for tests and hardware-free development
pub mod mock;

use crate::display::error::TransportError;

/// Largest single transaction when the transport does not say otherwise
/// (the Linux spidev default `bufsiz`)
pub const DEFAULT_MAX_TRANSFER: usize = 4096;

/// Logic level of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// The bus and control lines a panel sits on
///
/// Implementations own nothing of the panel protocol: they move bytes and
/// drive lines. The bus may be shared with other peripherals; the driver
/// brackets its own sequences with its chip-select line.
pub trait PanelTransport {
    /// Blocking write of one SPI transaction
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Drive a GPIO line
    fn set_line(&mut self, pin: u32, level: Level) -> Result<(), TransportError>;

    /// Set the SPI clock for subsequent transactions
    fn configure(&mut self, baudrate: u32) -> Result<(), TransportError>;

    /// Hand a line back (input / high impedance where the platform allows)
    fn release_line(&mut self, _pin: u32) -> Result<(), TransportError> {
        Ok(())
    }

    /// Longest buffer accepted by a single `write`
    fn max_transfer_len(&self) -> usize {
        DEFAULT_MAX_TRANSFER
    }
}
