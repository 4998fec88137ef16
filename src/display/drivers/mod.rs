/*
 *  display/drivers/mod.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Panel drivers
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

// MIPI-DCS panels (ST7789, ILI9341)
pub mod panel;

pub use panel::PanelDriver;
