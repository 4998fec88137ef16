/*
 *  display/controller/ili9341.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Ilitek ILI9341 power-on table
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

use super::{ControllerProfile, InitStep, SLPOUT};

const PWCTRA: u8 = 0xCB;
const PWCTRB: u8 = 0xCF;
const DTCTRA: u8 = 0xE8;
const DTCTRB: u8 = 0xEA;
const PWRSEQ: u8 = 0xED;
const PUMPRC: u8 = 0xF7;
const PWCTR1: u8 = 0xC0;
const PWCTR2: u8 = 0xC1;
const VMCTR1: u8 = 0xC5;
const VMCTR2: u8 = 0xC7;
const FRMCTR1: u8 = 0xB1;
const DFUNCTR: u8 = 0xB6;
const GAMMA3EN: u8 = 0xF2;
const GAMMASET: u8 = 0x26;
const GMCTRP1: u8 = 0xE0;
const GMCTRN1: u8 = 0xE1;

#[rustfmt::skip]
pub const INIT_SEQUENCE: &[InitStep] = &[
    InitStep::Cmd(PWCTRA, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    InitStep::Cmd(PWCTRB, &[0x00, 0xC1, 0x30]),
    InitStep::Cmd(DTCTRA, &[0x85, 0x00, 0x78]),
    InitStep::Cmd(DTCTRB, &[0x00, 0x00]),
    InitStep::Cmd(PWRSEQ, &[0x64, 0x03, 0x12, 0x81]),
    InitStep::Cmd(PUMPRC, &[0x20]),
    InitStep::Cmd(PWCTR1, &[0x23]),
    InitStep::Cmd(PWCTR2, &[0x10]),
    InitStep::Cmd(VMCTR1, &[0x3E, 0x28]),
    InitStep::Cmd(VMCTR2, &[0x86]),
    InitStep::Cmd(FRMCTR1, &[0x00, 0x18]),
    InitStep::Cmd(DFUNCTR, &[0x08, 0x82, 0x27]),
    InitStep::Cmd(GAMMA3EN, &[0x00]),
    InitStep::Cmd(GAMMASET, &[0x01]),
    InitStep::Cmd(GMCTRP1, &[
        0x0F, 0x31, 0x2B, 0x0C, 0x0E, 0x08, 0x4E, 0xF1,
        0x37, 0x07, 0x10, 0x03, 0x0E, 0x09, 0x00,
    ]),
    InitStep::Cmd(GMCTRN1, &[
        0x00, 0x0E, 0x14, 0x03, 0x11, 0x07, 0x31, 0xC1,
        0x48, 0x08, 0x0F, 0x0C, 0x31, 0x36, 0x0F,
    ]),
    InitStep::Cmd(SLPOUT, &[]),
    InitStep::DelayMs(120),
];

pub const PROFILE: ControllerProfile = ControllerProfile {
    name: "ILI9341",
    ram_columns: 240,
    ram_rows: 320,
    reset_pulse_ms: 10,
    reset_settle_ms: 120,
    max_clock_hz: 40_000_000,
    init_sequence: INIT_SEQUENCE,
};
