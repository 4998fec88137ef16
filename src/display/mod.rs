/*
 *  display/mod.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Display subsystem - panel driver, transports and rendering
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod state;
pub mod region;

// Panel configuration and controller command tables
pub mod panel;
pub mod controller;

// Wire-format packing
pub mod pixel;

// Bus + control lines
pub mod transport;

// Panel drivers
pub mod drivers;

// Band renderer for embedded-graphics
pub mod renderer;

// Re-exports for convenience
pub use traits::{DisplayPanel, DisplayCapabilities};
pub use error::{DriverError, TransportError};
pub use state::PanelState;
pub use region::FlushRegion;
pub use panel::{ByteOrder, ColorOrder, PanelConfig, PanelPins, PixelFormat};
pub use controller::{ControllerModel, ControllerProfile, InitStep};
pub use transport::{Level, PanelTransport};
pub use drivers::PanelDriver;
pub use renderer::{BandRenderer, DEFAULT_BAND_LINES};

#[cfg(feature = "linux")]
pub use transport::linux::LinuxTransport;
