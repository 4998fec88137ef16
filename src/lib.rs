/*
 *  lib.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Library root
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

//! Init and frame-flush driver for SPI-attached MIPI-DCS TFT panels
//!
//! [`PanelDriver`](display::PanelDriver) runs the controller power-on
//! sequence over a [`PanelTransport`](display::PanelTransport) and streams
//! packed pixel buffers into rectangular windows of panel RAM. A rendering
//! engine reaches it through the [`DisplayPanel`](display::DisplayPanel)
//! trait; [`BandRenderer`](display::BandRenderer) binds embedded-graphics
//! to that trait.

pub mod config;
pub mod display;
