/*
 *  display/error.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Error types for the panel driver and its transport
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

use thiserror::Error;

use crate::display::region::FlushRegion;
use crate::display::state::PanelState;

/// I/O-level failure reported by a [`PanelTransport`](crate::display::transport::PanelTransport)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// SPI write did not complete
    #[error("SPI write failed: {0}")]
    Bus(String),

    /// A control line could not be driven or released
    #[error("GPIO line {pin} failed: {message}")]
    Line { pin: u32, message: String },

    /// The bus could not be reconfigured (clock, mode, word size)
    #[error("SPI configuration failed: {0}")]
    Configure(String),

    /// The bus stayed busy past the caller's deadline
    #[error("transport timed out")]
    Timeout,
}

/// Unified error type for all panel operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Invalid static configuration, caught at construction
    #[error("invalid panel configuration: {0}")]
    Config(String),

    /// Transport failure; init and flush leave the driver Faulted
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Flush region outside the panel
    #[error("region {region} outside {width}x{height} panel")]
    OutOfBounds {
        region: FlushRegion,
        width: u16,
        height: u16,
    },

    /// Pixel buffer does not match the region
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// flush() outside the Ready state
    #[error("panel not ready (state {0:?})")]
    NotReady(PanelState),

    /// init() outside the Uninitialized state
    #[error("panel already initialized (state {0:?})")]
    AlreadyInitialized(PanelState),

    /// Operation needs hardware this panel was not wired with
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl DriverError {
    /// True for errors that moved (or found) the driver in the Faulted state
    pub fn is_fatal(&self) -> bool {
        match self {
            DriverError::Transport(_) => true,
            DriverError::NotReady(state) | DriverError::AlreadyInitialized(state) => state.is_faulted(),
            _ => false,
        }
    }
}
