/*
 *  display/transport/mock.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Mock transport and delay for testing without hardware
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

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;

use crate::display::error::TransportError;
use crate::display::panel::PanelPins;
use crate::display::transport::{Level, PanelTransport, DEFAULT_MAX_TRANSFER};

/// One call made on the transport, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// SPI write with the D/C and CS levels seen at the time
    Write { dc: Level, cs: Level, bytes: Vec<u8> },
    Line { pin: u32, level: Level },
    Release { pin: u32 },
    Configure { baudrate: u32 },
}

/// A command byte and everything written in data mode after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub op: u8,
    pub params: Vec<u8>,
    /// Number of data-mode writes that made up `params`
    pub data_writes: usize,
}

/// Internal state for the mock transport (shared for inspection in tests)
#[derive(Debug)]
pub struct MockTransportState {
    pub pins: PanelPins,

    /// Every call, in order
    pub events: Vec<TransportEvent>,

    /// Current level of each line driven so far
    pub lines: BTreeMap<u32, Level>,

    /// Successful writes so far
    pub write_count: usize,

    /// Successful line changes so far
    pub line_count: usize,

    /// Writes at or after this index fail with a bus error
    pub fail_write_at: Option<usize>,

    /// Line changes fail
    pub fail_lines: bool,

    /// Line changes at or after this index fail
    pub fail_line_at: Option<usize>,

    /// Bus reconfiguration fails
    pub fail_configure: bool,

    /// Reported transaction cap
    pub max_transfer: usize,
}

impl MockTransportState {
    fn level(&self, pin: u32) -> Level {
        // unconfigured outputs idle high, like the pulled-up CS/RESX pads
        self.lines.get(&pin).copied().unwrap_or(Level::High)
    }

    /// Total transport calls, of any kind
    pub fn call_count(&self) -> usize {
        self.events.len()
    }

    /// Writes grouped into command + data-mode payload
    ///
    /// Data written before any command is dropped.
    pub fn commands(&self) -> Vec<CommandRecord> {
        let mut out: Vec<CommandRecord> = Vec::new();
        for event in &self.events {
            let TransportEvent::Write { dc, bytes, .. } = event else {
                continue;
            };
            match dc {
                Level::Low => out.extend(bytes.iter().map(|&op| CommandRecord {
                    op,
                    params: Vec::new(),
                    data_writes: 0,
                })),
                Level::High => {
                    if let Some(last) = out.last_mut() {
                        last.params.extend_from_slice(bytes);
                        last.data_writes += 1;
                    }
                }
            }
        }
        out
    }

    /// Command records for one opcode
    pub fn commands_with(&self, op: u8) -> Vec<CommandRecord> {
        self.commands().into_iter().filter(|c| c.op == op).collect()
    }

    /// High-to-low-to-high cycles seen on the reset line
    pub fn reset_pulses(&self) -> usize {
        let reset = self.pins.reset;
        let mut pulses = 0;
        let mut low = false;
        for event in &self.events {
            match event {
                TransportEvent::Line { pin, level: Level::Low } if *pin == reset => low = true,
                TransportEvent::Line { pin, level: Level::High } if *pin == reset && low => {
                    low = false;
                    pulses += 1;
                }
                _ => {}
            }
        }
        pulses
    }

    /// Writes issued while chip-select was not asserted
    pub fn writes_without_cs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TransportEvent::Write { cs: Level::High, .. }))
            .count()
    }

    /// Largest single write
    pub fn largest_write(&self) -> usize {
        self.events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Write { bytes, .. } => Some(bytes.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn released(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Release { pin } => Some(*pin),
                _ => None,
            })
            .collect()
    }
}

/// Mock transport for testing
///
/// Records every call and lets tests inject failures. The state is shared
/// through an `Arc<Mutex<_>>`, so a clone kept by the test can inspect it
/// while a driver holds the transport borrow.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new(pins: PanelPins) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTransportState {
                pins,
                events: Vec::new(),
                lines: BTreeMap::new(),
                write_count: 0,
                line_count: 0,
                fail_write_at: None,
                fail_lines: false,
                fail_line_at: None,
                fail_configure: false,
                max_transfer: DEFAULT_MAX_TRANSFER,
            })),
        }
    }

    /// Locked view of the state
    pub fn snapshot(&self) -> MutexGuard<'_, MockTransportState> {
        self.lock()
    }

    /// Forget recorded events, keep line levels and failure settings
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn set_max_transfer(&self, len: usize) {
        self.lock().max_transfer = len;
    }

    /// Fail the `index`-th write (0-based) and every write after it
    pub fn fail_write_at(&self, index: usize) {
        self.lock().fail_write_at = Some(index);
    }

    pub fn fail_lines(&self, fail: bool) {
        self.lock().fail_lines = fail;
    }

    /// Fail the `index`-th line change (0-based) and every one after it
    pub fn fail_line_at(&self, index: usize) {
        self.lock().fail_line_at = Some(index);
    }

    pub fn fail_configure(&self, fail: bool) {
        self.lock().fail_configure = fail;
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportState> {
        // a test that panicked mid-call still leaves readable state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PanelTransport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();

        if state.fail_write_at.is_some_and(|at| state.write_count >= at) {
            return Err(TransportError::Bus("Simulated write failure".to_string()));
        }
        if bytes.len() > state.max_transfer {
            return Err(TransportError::Bus(format!(
                "transaction of {} bytes exceeds {}",
                bytes.len(),
                state.max_transfer
            )));
        }

        let dc = state.level(state.pins.dc);
        let cs = state.level(state.pins.cs);
        state.events.push(TransportEvent::Write { dc, cs, bytes: bytes.to_vec() });
        state.write_count += 1;
        Ok(())
    }

    fn set_line(&mut self, pin: u32, level: Level) -> Result<(), TransportError> {
        let mut state = self.lock();

        if state.fail_lines || state.fail_line_at.is_some_and(|at| state.line_count >= at) {
            return Err(TransportError::Line {
                pin,
                message: "Simulated line failure".to_string(),
            });
        }

        state.lines.insert(pin, level);
        state.events.push(TransportEvent::Line { pin, level });
        state.line_count += 1;
        Ok(())
    }

    fn configure(&mut self, baudrate: u32) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.fail_configure {
            return Err(TransportError::Configure("Simulated configure failure".to_string()));
        }
        state.events.push(TransportEvent::Configure { baudrate });
        Ok(())
    }

    fn release_line(&mut self, pin: u32) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.lines.remove(&pin);
        state.events.push(TransportEvent::Release { pin });
        Ok(())
    }

    fn max_transfer_len(&self) -> usize {
        self.lock().max_transfer
    }
}

/// Delay that returns immediately and records what was asked for
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    waits_ns: Arc<Mutex<Vec<u64>>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded waits, in nanoseconds
    pub fn waits_ns(&self) -> Vec<u64> {
        self.waits_ns.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn total_ms(&self) -> u64 {
        self.waits_ns().iter().sum::<u64>() / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        if let Ok(mut waits) = self.waits_ns.lock() {
            waits.push(ns as u64);
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        if let Ok(mut waits) = self.waits_ns.lock() {
            waits.push(ms as u64 * 1_000_000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins() -> PanelPins {
        PanelPins { reset: 1, dc: 2, cs: 3, backlight: None, backlight_active_low: false }
    }

    #[test]
    fn test_mock_records_dc_and_cs() {
        let mut mock = MockTransport::new(pins());
        mock.set_line(3, Level::Low).unwrap();
        mock.set_line(2, Level::Low).unwrap();
        mock.write(&[0x2A]).unwrap();
        mock.set_line(2, Level::High).unwrap();
        mock.write(&[0, 0, 0, 9]).unwrap();
        mock.set_line(3, Level::High).unwrap();
        mock.write(&[0xFF]).unwrap();

        let state = mock.snapshot();
        let commands = state.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].op, 0x2A);
        assert_eq!(commands[0].params, vec![0, 0, 0, 9, 0xFF]);
        assert_eq!(state.writes_without_cs(), 1);
    }

    #[test]
    fn test_mock_counts_reset_pulses() {
        let mut mock = MockTransport::new(pins());
        mock.set_line(1, Level::High).unwrap();
        mock.set_line(1, Level::Low).unwrap();
        mock.set_line(1, Level::High).unwrap();
        assert_eq!(mock.snapshot().reset_pulses(), 1);
    }

    #[test]
    fn test_mock_simulated_write_failure() {
        let mut mock = MockTransport::new(pins());
        mock.fail_write_at(1);
        assert!(mock.write(&[1]).is_ok());
        assert!(mock.write(&[2]).is_err());
        assert!(mock.write(&[3]).is_err());
        assert_eq!(mock.snapshot().write_count, 1);
    }

    #[test]
    fn test_mock_simulated_line_failures() {
        let mut mock = MockTransport::new(pins());
        mock.fail_line_at(2);
        assert!(mock.set_line(1, Level::Low).is_ok());
        assert!(mock.set_line(2, Level::Low).is_ok());
        assert!(matches!(mock.set_line(3, Level::Low), Err(TransportError::Line { pin: 3, .. })));
        assert_eq!(mock.snapshot().line_count, 2);

        let mut mock = MockTransport::new(pins());
        mock.fail_configure(true);
        assert!(matches!(mock.configure(1_000_000), Err(TransportError::Configure(_))));
        assert_eq!(mock.snapshot().call_count(), 0);
    }

    #[test]
    fn test_mock_rejects_oversized_write() {
        let mut mock = MockTransport::new(pins());
        mock.set_max_transfer(4);
        assert!(mock.write(&[0; 5]).is_err());
        assert!(mock.write(&[0; 4]).is_ok());
    }

    #[test]
    fn test_mock_delay_records_ms() {
        let mut delay = MockDelay::new();
        delay.delay_ms(10);
        delay.delay_ms(120);
        assert_eq!(delay.total_ms(), 130);
    }
}
