/*
 *  display/controller/st7789.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Sitronix ST7789 / ST7789V power-on table
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

use super::{ControllerProfile, InitStep, NORON, SLPOUT};

/// RAM control: RGB interface off, MCU data, big-endian RGB565
const RAMCTRL: u8 = 0xB0;

/// SLPOUT must be followed by 120 ms before another sleep command and
/// 5 ms before anything else
pub const INIT_SEQUENCE: &[InitStep] = &[
    InitStep::Cmd(SLPOUT, &[]),
    InitStep::DelayMs(120),
    InitStep::Cmd(NORON, &[]),
    InitStep::Cmd(RAMCTRL, &[0x00, 0xF0]),
];

pub const PROFILE: ControllerProfile = ControllerProfile {
    name: "ST7789",
    ram_columns: 240,
    ram_rows: 320,
    reset_pulse_ms: 10,
    reset_settle_ms: 120,
    max_clock_hz: 62_500_000,
    init_sequence: INIT_SEQUENCE,
};
