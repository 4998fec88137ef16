/*
 *  display/state.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Panel lifecycle states
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

/// Where the panel is in its power-on handshake
///
/// ```text
/// Uninitialized -> Resetting -> Configuring -> Ready
///        \______________\____________\_________\__-> Faulted (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    /// Constructed, no I/O performed yet
    #[default]
    Uninitialized,

    /// Hardware reset pulse in progress
    Resetting,

    /// Command table being transmitted
    Configuring,

    /// Accepting flushes
    Ready,

    /// A transport failure left the controller in an unknown state
    Faulted,
}

impl PanelState {
    pub fn is_ready(self) -> bool {
        self == PanelState::Ready
    }

    pub fn is_faulted(self) -> bool {
        self == PanelState::Faulted
    }
}
