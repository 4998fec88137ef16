/*
 *  display/drivers/panel.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  MIPI-DCS panel driver: power-on sequencing and windowed flush
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

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::display::controller::{
    self, ControllerProfile, InitStep, CASET, COLMOD, DISPOFF, DISPON, INVOFF, INVON, MADCTL,
    RAMWR, RASET,
};
use crate::display::error::{DriverError, TransportError};
use crate::display::panel::{ByteOrder, ColorOrder, PanelConfig, PixelFormat};
use crate::display::pixel;
use crate::display::region::FlushRegion;
use crate::display::state::PanelState;
use crate::display::traits::{DisplayCapabilities, DisplayPanel};
use crate::display::transport::{Level, PanelTransport};

/// Driver for one SPI-attached panel
///
/// Borrows the transport for its whole lifetime and owns the delay
/// provider. Not thread-safe; callers sharing a bus across threads must
/// serialize access themselves.
pub struct PanelDriver<'a, T: PanelTransport, D: DelayNs> {
    transport: &'a mut T,
    delay: D,
    config: PanelConfig,
    profile: &'static ControllerProfile,
    capabilities: DisplayCapabilities,
    state: PanelState,
    /// Set once teardown has handed the lines back
    released: bool,
    /// Byte-swap scratch for little-endian buffers
    staging: Vec<u8>,
}

impl<'a, T: PanelTransport, D: DelayNs> PanelDriver<'a, T, D> {
    /// Create a driver; performs no I/O
    ///
    /// # Arguments
    ///
    /// * `transport` - SPI bus and control lines, borrowed for the driver's lifetime
    /// * `delay` - Blocking delay used for reset and table timing
    /// * `config` - Panel configuration, validated against the controller model
    pub fn new(transport: &'a mut T, delay: D, config: &PanelConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let profile = config.model.profile();

        let capabilities = DisplayCapabilities {
            controller: profile.name,
            width: config.width,
            height: config.height,
            color_order: config.color_order,
            pixel_format: config.pixel_format,
            byte_order: config.byte_order,
            supports_backlight: config.pins.backlight.is_some(),
        };

        Ok(Self {
            transport,
            delay,
            config: config.clone(),
            profile,
            capabilities,
            state: PanelState::Uninitialized,
            released: false,
            staging: Vec::new(),
        })
    }

    pub fn width(&self) -> u16 {
        self.config.width
    }

    pub fn height(&self) -> u16 {
        self.config.height
    }

    pub fn color_order(&self) -> ColorOrder {
        self.config.color_order
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.config.pixel_format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.config.bytes_per_pixel()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn profile(&self) -> &'static ControllerProfile {
        self.profile
    }

    /// Bytes a flush of `region` must carry
    pub fn buffer_len(&self, region: &FlushRegion) -> usize {
        pixel::buffer_len(region, self.config.pixel_format)
    }

    /// Power-on sequence: reset pulse, vendor table, configuration, display on
    fn power_on(&mut self) -> Result<(), DriverError> {
        let pins = self.config.pins;

        self.state = PanelState::Resetting;
        self.transport.configure(self.config.pixel_clock_hz)?;
        self.transport.set_line(pins.cs, Level::High)?;
        self.transport.set_line(pins.reset, Level::Low)?;
        self.delay.delay_ms(self.profile.reset_pulse_ms);
        self.transport.set_line(pins.reset, Level::High)?;
        self.delay.delay_ms(self.profile.reset_settle_ms);

        self.state = PanelState::Configuring;
        self.with_cs(|d| {
            d.run_table(d.profile.init_sequence)?;
            d.apply_config()?;
            if d.config.clear_on_init {
                d.blank()?;
            }
            d.write_command(DISPON, &[])
        })
    }

    /// Interpreter for a controller power-on table
    fn run_table(&mut self, table: &[InitStep]) -> Result<(), DriverError> {
        for step in table {
            match *step {
                InitStep::Cmd(op, params) => {
                    debug!("{} cmd 0x{:02X} ({} params)", self.profile.name, op, params.len());
                    self.write_command(op, params)?;
                }
                InitStep::DelayMs(ms) => self.delay.delay_ms(ms),
            }
        }
        Ok(())
    }

    /// Commands derived from the configuration
    fn apply_config(&mut self) -> Result<(), DriverError> {
        let c = &self.config;
        let madctl = controller::madctl(c.swap_xy, c.mirror_x, c.mirror_y, c.color_order);
        let colmod = controller::colmod(c.pixel_format);
        let invert = if c.invert { INVON } else { INVOFF };

        self.write_command(MADCTL, &[madctl])?;
        self.write_command(COLMOD, &[colmod])?;
        self.write_command(invert, &[])
    }

    /// Zero the visible RAM so power-on noise never shows
    fn blank(&mut self) -> Result<(), DriverError> {
        let region = FlushRegion::full(self.config.width, self.config.height);
        let mut remaining = self.buffer_len(&region);
        let zeros = vec![0u8; self.chunk_len().min(remaining)];

        self.set_window(&region)?;
        self.write_command(RAMWR, &[])?;
        self.transport.set_line(self.config.pins.dc, Level::High)?;
        while remaining > 0 {
            let n = zeros.len().min(remaining);
            self.transport.write(&zeros[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    fn write_command(&mut self, op: u8, params: &[u8]) -> Result<(), DriverError> {
        let dc = self.config.pins.dc;
        self.transport.set_line(dc, Level::Low)?;
        self.transport.write(&[op])?;
        if !params.is_empty() {
            self.transport.set_line(dc, Level::High)?;
            self.transport.write(params)?;
        }
        Ok(())
    }

    /// CASET + RASET, shifted by the RAM offset
    fn set_window(&mut self, region: &FlushRegion) -> Result<(), DriverError> {
        let (dx, dy) = (self.config.x_offset, self.config.y_offset);
        let columns = controller::address_window(region.x0 + dx, region.x1 + dx);
        let rows = controller::address_window(region.y0 + dy, region.y1 + dy);
        self.write_command(CASET, &columns)?;
        self.write_command(RASET, &rows)
    }

    /// Largest pixel-aligned transaction the transport accepts
    fn chunk_len(&self) -> usize {
        let bpp = self.bytes_per_pixel();
        (self.transport.max_transfer_len() / bpp).max(1) * bpp
    }

    fn write_pixels(&mut self, pixels: &[u8]) -> Result<(), DriverError> {
        let chunk = self.chunk_len();
        self.transport.set_line(self.config.pins.dc, Level::High)?;

        match self.config.byte_order {
            ByteOrder::Big => {
                for part in pixels.chunks(chunk) {
                    self.transport.write(part)?;
                }
            }
            ByteOrder::Little => {
                for part in pixels.chunks(chunk) {
                    self.staging.clear();
                    self.staging.extend_from_slice(part);
                    pixel::swap_rgb565_bytes(&mut self.staging);
                    self.transport.write(&self.staging)?;
                }
            }
        }
        Ok(())
    }

    /// Runs `f` with chip-select asserted; CS is released even when `f` fails
    fn with_cs<F>(&mut self, f: F) -> Result<(), DriverError>
    where
        F: FnOnce(&mut Self) -> Result<(), DriverError>,
    {
        let cs = self.config.pins.cs;
        self.transport.set_line(cs, Level::Low)?;
        let result = f(self);
        let released = self.transport.set_line(cs, Level::High);
        result?;
        released.map_err(DriverError::from)
    }

    /// Moves to Faulted on transport errors, passes everything through
    fn fault(&mut self, err: DriverError) -> DriverError {
        if matches!(err, DriverError::Transport(_)) {
            error!("{} faulted in state {:?}: {}", self.profile.name, self.state, err);
            self.state = PanelState::Faulted;
        }
        err
    }

    fn ensure_lines(&self) -> Result<(), DriverError> {
        if self.released {
            return Err(DriverError::Unsupported("control lines released by teardown"));
        }
        Ok(())
    }
}

impl<T: PanelTransport, D: DelayNs> DisplayPanel for PanelDriver<'_, T, D> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn is_released(&self) -> bool {
        self.released
    }

    fn init(&mut self) -> Result<(), DriverError> {
        if self.state != PanelState::Uninitialized {
            return Err(DriverError::AlreadyInitialized(self.state));
        }
        self.ensure_lines()?;

        info!(
            "Initializing {} {}x{} {}bpp at {} Hz",
            self.profile.name,
            self.config.width,
            self.config.height,
            self.config.pixel_format.bits_per_pixel(),
            self.config.pixel_clock_hz
        );

        match self.power_on() {
            Ok(()) => {
                self.state = PanelState::Ready;
                info!("{} ready", self.profile.name);
                Ok(())
            }
            Err(e) => {
                // a half-sent table leaves the controller in an unknown state
                self.state = PanelState::Faulted;
                error!("{} initialization failed: {}", self.profile.name, e);
                Err(e)
            }
        }
    }

    fn flush(&mut self, region: FlushRegion, pixels: &[u8]) -> Result<(), DriverError> {
        if !self.state.is_ready() {
            return Err(DriverError::NotReady(self.state));
        }
        self.ensure_lines()?;

        let (width, height) = (self.config.width, self.config.height);
        if !region.fits(width, height) {
            return Err(DriverError::OutOfBounds { region, width, height });
        }

        let expected = self.buffer_len(&region);
        if pixels.len() != expected {
            return Err(DriverError::BufferSizeMismatch { expected, actual: pixels.len() });
        }

        debug!("Flushing {} ({} bytes)", region, pixels.len());
        self.with_cs(|d| {
            d.set_window(&region)?;
            d.write_command(RAMWR, &[])?;
            d.write_pixels(pixels)
        })
        .map_err(|e| self.fault(e))
    }

    fn set_backlight(&mut self, level: u8) -> Result<(), DriverError> {
        let Some(pin) = self.config.pins.backlight else {
            return Err(DriverError::Unsupported("no backlight line"));
        };
        self.ensure_lines()?;

        let on = level > 0;
        let high = on != self.config.pins.backlight_active_low;
        debug!("Backlight {}", if on { "on" } else { "off" });
        self.transport.set_line(pin, Level::from(high))?;
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), DriverError> {
        if self.released {
            return Ok(());
        }
        info!("Tearing down {}", self.profile.name);

        if self.state.is_ready() {
            if let Err(e) = self.with_cs(|d| d.write_command(DISPOFF, &[])) {
                warn!("Display off failed during teardown: {}", e);
            }
        }

        let pins = self.config.pins;
        let mut first_err: Option<DriverError> = None;
        let mut note = |r: Result<(), TransportError>| {
            if let Err(e) = r {
                warn!("Teardown: {}", e);
                first_err.get_or_insert(e.into());
            }
        };

        note(self.transport.set_line(pins.cs, Level::High));
        if let Some(bl) = pins.backlight {
            note(self.transport.set_line(bl, Level::from(pins.backlight_active_low)));
        }
        for pin in [pins.reset, pins.dc, pins.cs].into_iter().chain(pins.backlight) {
            note(self.transport.release_line(pin));
        }

        self.released = true;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: PanelTransport, D: DelayNs> Drop for PanelDriver<'_, T, D> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::controller::{ControllerModel, MADCTL_BGR, MADCTL_MV};
    use crate::display::panel::PanelPins;
    use crate::display::transport::mock::{MockDelay, MockTransport};

    fn pins() -> PanelPins {
        PanelPins { reset: 4, dc: 5, cs: 6, backlight: Some(7), backlight_active_low: false }
    }

    fn config() -> PanelConfig {
        PanelConfig {
            width: 320,
            height: 240,
            swap_xy: true,
            clear_on_init: false,
            pins: pins(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_performs_no_io() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        assert_eq!(driver.state(), PanelState::Uninitialized);
        assert_eq!(driver.dimensions(), (320, 240));
        drop(driver);
        // drop releases lines but never touches the bus
        assert_eq!(observer.snapshot().write_count, 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut mock = MockTransport::new(pins());
        let bad = PanelConfig { width: 0, ..config() };
        assert!(matches!(
            PanelDriver::new(&mut mock, MockDelay::new(), &bad),
            Err(DriverError::Config(_))
        ));
    }

    #[test]
    fn test_init_sequence_order() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let delay = MockDelay::new();
        let mut driver = PanelDriver::new(&mut mock, delay.clone(), &config()).unwrap();

        driver.init().unwrap();
        assert_eq!(driver.state(), PanelState::Ready);

        let state = observer.snapshot();
        assert_eq!(state.reset_pulses(), 1);
        assert_eq!(state.writes_without_cs(), 0);

        let ops: Vec<u8> = state.commands().iter().map(|c| c.op).collect();
        let madctl = ops.iter().position(|&op| op == MADCTL).unwrap();
        let colmod = ops.iter().position(|&op| op == COLMOD).unwrap();
        let invoff = ops.iter().position(|&op| op == INVOFF).unwrap();
        assert!(madctl < colmod && colmod < invoff);
        assert_eq!(ops.last(), Some(&DISPON));

        // reset pulse plus settle plus the table's sleep-out wait
        assert!(delay.total_ms() >= 10 + 120 + 120);
    }

    #[test]
    fn test_landscape_bgr_madctl_and_colmod() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig {
            width: 296,
            height: 240,
            color_order: ColorOrder::Bgr,
            ..config()
        };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();

        let state = observer.snapshot();
        let madctl = state.commands_with(MADCTL);
        assert_eq!(madctl.len(), 1);
        assert_eq!(madctl[0].params, vec![MADCTL_MV | MADCTL_BGR]);
        assert_eq!(state.commands_with(COLMOD)[0].params, vec![0x55]);
    }

    #[test]
    fn test_invert_sends_invon() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig { invert: true, ..config() };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();

        let state = observer.snapshot();
        assert_eq!(state.commands_with(INVON).len(), 1);
        assert!(state.commands_with(INVOFF).is_empty());
    }

    #[test]
    fn test_init_twice_rejected() {
        let mut mock = MockTransport::new(pins());
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        assert!(matches!(
            driver.init(),
            Err(DriverError::AlreadyInitialized(PanelState::Ready))
        ));
        assert_eq!(driver.state(), PanelState::Ready);
    }

    #[test]
    fn test_init_failure_faults() {
        let mut mock = MockTransport::new(pins());
        mock.fail_write_at(2);
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();

        let err = driver.init().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(driver.state(), PanelState::Faulted);
        assert!(matches!(
            driver.flush(FlushRegion::new(0, 0, 0, 0), &[0, 0]),
            Err(DriverError::NotReady(PanelState::Faulted))
        ));
    }

    #[test]
    fn test_flush_before_init_is_rejected_without_io() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();

        let err = driver.flush(FlushRegion::new(0, 0, 0, 0), &[0, 0]).unwrap_err();
        assert!(matches!(err, DriverError::NotReady(PanelState::Uninitialized)));
        assert_eq!(observer.snapshot().call_count(), 0);
    }

    #[test]
    fn test_flush_window_and_payload() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        let region = FlushRegion::new(0, 0, 319, 19);
        let pixels = vec![0xAB; 320 * 20 * 2];
        driver.flush(region, &pixels).unwrap();

        let state = observer.snapshot();
        let commands = state.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].op, CASET);
        assert_eq!(commands[0].params, vec![0x00, 0x00, 0x01, 0x3F]);
        assert_eq!(commands[1].op, RASET);
        assert_eq!(commands[1].params, vec![0x00, 0x00, 0x00, 0x13]);
        assert_eq!(commands[2].op, RAMWR);
        assert_eq!(commands[2].params, pixels);
        // 12800 bytes in 4096-byte transactions
        assert_eq!(commands[2].data_writes, 4);
        assert!(state.largest_write() <= 4096);
        assert_eq!(state.writes_without_cs(), 0);
    }

    #[test]
    fn test_flush_single_pixel() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        driver.flush(FlushRegion::new(319, 239, 319, 239), &[0xF8, 0x00]).unwrap();

        let state = observer.snapshot();
        let ramwr = state.commands_with(RAMWR);
        assert_eq!(ramwr[0].params, vec![0xF8, 0x00]);
        assert_eq!(state.commands_with(CASET)[0].params, vec![0x01, 0x3F, 0x01, 0x3F]);
    }

    #[test]
    fn test_flush_out_of_bounds_and_size_mismatch() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        let err = driver.flush(FlushRegion::new(0, 0, 320, 10), &[0; 321 * 11 * 2]).unwrap_err();
        assert!(matches!(err, DriverError::OutOfBounds { .. }));

        let err = driver.flush(FlushRegion::new(5, 0, 4, 0), &[]).unwrap_err();
        assert!(matches!(err, DriverError::OutOfBounds { .. }));

        let err = driver.flush(FlushRegion::row(0, 320), &[0; 10]).unwrap_err();
        assert!(matches!(err, DriverError::BufferSizeMismatch { expected: 640, actual: 10 }));

        assert_eq!(observer.snapshot().call_count(), 0);
        assert_eq!(driver.state(), PanelState::Ready);
    }

    #[test]
    fn test_flush_transport_error_faults() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();

        let written = observer.snapshot().write_count;
        observer.fail_write_at(written + 1);
        let err = driver.flush(FlushRegion::row(0, 320), &[0; 640]).unwrap_err();
        assert!(matches!(err, DriverError::Transport(_)));
        assert_eq!(driver.state(), PanelState::Faulted);
    }

    #[test]
    fn test_offsets_shift_window() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig {
            width: 240,
            height: 135,
            x_offset: 40,
            y_offset: 53,
            ..config()
        };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        driver.flush(FlushRegion::new(0, 0, 0, 0), &[0, 0]).unwrap();
        let state = observer.snapshot();
        assert_eq!(state.commands_with(CASET)[0].params, vec![0, 40, 0, 40]);
        assert_eq!(state.commands_with(RASET)[0].params, vec![0, 53, 0, 53]);
    }

    #[test]
    fn test_little_endian_buffers_are_swapped() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig { byte_order: ByteOrder::Little, ..config() };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        driver.flush(FlushRegion::new(0, 0, 1, 0), &[0x00, 0xF8, 0x1F, 0x00]).unwrap();
        let state = observer.snapshot();
        assert_eq!(state.commands_with(RAMWR)[0].params, vec![0xF8, 0x00, 0x00, 0x1F]);
    }

    #[test]
    fn test_rgb666_chunks_stay_pixel_aligned() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        mock.set_max_transfer(1000);
        let cfg = PanelConfig { pixel_format: PixelFormat::Rgb666, ..config() };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        driver.flush(FlushRegion::row(0, 320), &[0xFC; 960]).unwrap();
        let state = observer.snapshot();
        assert_eq!(state.commands_with(RAMWR)[0].params.len(), 960);
        assert_eq!(state.largest_write(), 960);
    }

    #[test]
    fn test_clear_on_init_blanks_whole_panel() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig { clear_on_init: true, ..config() };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();

        let state = observer.snapshot();
        let ramwr = state.commands_with(RAMWR);
        assert_eq!(ramwr.len(), 1);
        assert_eq!(ramwr[0].params.len(), 320 * 240 * 2);
        assert!(ramwr[0].params.iter().all(|&b| b == 0));
        assert!(state.largest_write() <= 4096);

        // blanking lands before display-on
        let ops: Vec<u8> = state.commands().iter().map(|c| c.op).collect();
        let blank = ops.iter().position(|&op| op == RAMWR).unwrap();
        let on = ops.iter().position(|&op| op == DISPON).unwrap();
        assert!(blank < on);
    }

    #[test]
    fn test_ili9341_runs_its_own_table() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig { model: ControllerModel::Ili9341, pixel_clock_hz: 40_000_000, ..config() };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        driver.init().unwrap();

        assert_eq!(driver.capabilities().controller, "ILI9341");
        let state = observer.snapshot();
        let table_cmds = ControllerModel::Ili9341
            .profile()
            .init_sequence
            .iter()
            .filter(|s| matches!(s, InitStep::Cmd(..)))
            .count();
        // table + MADCTL, COLMOD, INVOFF, DISPON
        assert_eq!(state.commands().len(), table_cmds + 4);
    }

    #[test]
    fn test_backlight_polarity() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let cfg = PanelConfig {
            pins: PanelPins { backlight_active_low: true, ..pins() },
            ..config()
        };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();

        driver.set_backlight(255).unwrap();
        assert_eq!(observer.snapshot().lines.get(&7), Some(&Level::Low));
        driver.set_backlight(0).unwrap();
        assert_eq!(observer.snapshot().lines.get(&7), Some(&Level::High));
    }

    #[test]
    fn test_backlight_unwired() {
        let mut mock = MockTransport::new(pins());
        let cfg = PanelConfig {
            pins: PanelPins { backlight: None, ..pins() },
            ..config()
        };
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &cfg).unwrap();
        assert!(!driver.capabilities().supports_backlight);
        assert!(matches!(driver.set_backlight(100), Err(DriverError::Unsupported(_))));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        observer.clear_events();

        driver.teardown().unwrap();
        {
            let state = observer.snapshot();
            assert_eq!(state.commands_with(DISPOFF).len(), 1);
            let mut released = state.released();
            released.sort_unstable();
            assert_eq!(released, vec![4, 5, 6, 7]);
        }

        observer.clear_events();
        driver.teardown().unwrap();
        drop(driver);
        assert_eq!(observer.snapshot().call_count(), 0);
    }

    #[test]
    fn test_teardown_after_fault_skips_display_off() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        mock.fail_write_at(0);
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        assert!(driver.init().is_err());

        driver.teardown().unwrap();
        let state = observer.snapshot();
        assert_eq!(state.released().len(), 4);
        assert!(state.commands_with(DISPOFF).is_empty());
    }

    #[test]
    fn test_flush_error_survives_failed_cs_release() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();

        // CS low and DC low go through, the CASET byte fails, then so does CS high
        let (writes, lines) = {
            let state = observer.snapshot();
            (state.write_count, state.line_count)
        };
        observer.fail_write_at(writes);
        observer.fail_line_at(lines + 2);
        let err = driver.flush(FlushRegion::row(0, 320), &[0; 640]).unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Bus(_))), "{err}");
        assert_eq!(driver.state(), PanelState::Faulted);
    }

    #[test]
    fn test_teardown_keeps_going_after_line_errors() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        observer.fail_lines(true);
        observer.clear_events();

        // CS high is the first line touched, so its error is the one returned
        let err = driver.teardown().unwrap_err();
        assert!(
            matches!(err, DriverError::Transport(TransportError::Line { pin: 6, .. })),
            "{err}"
        );
        let mut released = observer.snapshot().released();
        released.sort_unstable();
        assert_eq!(released, vec![4, 5, 6, 7]);

        observer.clear_events();
        driver.teardown().unwrap();
        assert_eq!(observer.snapshot().call_count(), 0);
    }

    #[test]
    fn test_configure_failure_faults_before_reset() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        mock.fail_configure(true);
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();

        let err = driver.init().unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Configure(_))), "{err}");
        assert_eq!(driver.state(), PanelState::Faulted);

        let state = observer.snapshot();
        assert_eq!(state.write_count, 0);
        assert_eq!(state.reset_pulses(), 0);
    }

    #[test]
    fn test_reset_line_failure_faults() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        mock.fail_lines(true);
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();

        let err = driver.init().unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Line { .. })), "{err}");
        assert!(err.is_fatal());
        assert_eq!(driver.state(), PanelState::Faulted);
        assert_eq!(observer.snapshot().write_count, 0);
    }

    #[test]
    fn test_released_panel_keeps_state_but_refuses_io() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
        driver.init().unwrap();
        assert!(!driver.is_released());

        driver.teardown().unwrap();
        observer.clear_events();

        assert_eq!(driver.state(), PanelState::Ready);
        assert!(driver.is_released());
        assert!(matches!(
            driver.flush(FlushRegion::row(0, 320), &[0; 640]),
            Err(DriverError::Unsupported(_))
        ));
        assert!(matches!(driver.set_backlight(255), Err(DriverError::Unsupported(_))));
        assert_eq!(observer.snapshot().call_count(), 0);
    }

    #[test]
    fn test_drop_tears_down() {
        let mut mock = MockTransport::new(pins());
        let observer = mock.clone();
        {
            let mut driver = PanelDriver::new(&mut mock, MockDelay::new(), &config()).unwrap();
            driver.init().unwrap();
        }
        let state = observer.snapshot();
        assert_eq!(state.commands_with(DISPOFF).len(), 1);
        assert_eq!(state.lines.get(&6), None);
    }
}
