/*
 *  main.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Panel bring-up: init, one test frame, teardown
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

use std::{thread, time::Duration};

use anyhow::{Context, Result};
use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::{Rgb565, Rgb888},
    prelude::*,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use env_logger::Env;
use linux_embedded_hal::Delay;
use log::{info, warn};

use spipanel::config;
use spipanel::display::{BandRenderer, DisplayPanel, LinuxTransport, PanelDriver, DEFAULT_BAND_LINES};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

const LABEL: &str = "Hello world";

fn main() -> Result<()> {
    let cfg = config::load().context("Failed to load configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This is {}", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let panel_cfg = cfg.panel_config();
    let mut transport = LinuxTransport::open(
        cfg.spi_device(),
        cfg.gpiochip(),
        panel_cfg.pixel_clock_hz,
        cfg.max_transfer(),
    )
    .context("Failed to open panel transport")?;

    let mut panel = PanelDriver::new(&mut transport, Delay, &panel_cfg)?;
    panel.init().context("Panel initialization failed")?;

    if panel.capabilities().supports_backlight {
        if let Err(e) = panel.set_backlight(cfg.backlight.unwrap_or(u8::MAX)) {
            warn!("Backlight: {}", e);
        }
    }

    let bands = draw_hello(&mut panel)?;
    info!("Frame flushed in {} bands", bands);

    if let Some(secs) = cfg.hold_secs.filter(|s| *s > 0) {
        info!("Holding for {}s", secs);
        thread::sleep(Duration::from_secs(secs));
    }

    panel.teardown().context("Teardown failed")?;
    Ok(())
}

/// Dark teal background with a white label in the middle
fn draw_hello(panel: &mut dyn DisplayPanel) -> Result<usize> {
    let (width, height) = panel.dimensions();
    let background = Rgb565::from(Rgb888::new(0x00, 0x3a, 0x57));
    let font = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    let center = Point::new(width as i32 / 2, height as i32 / 2);

    let mut renderer = BandRenderer::new(panel.capabilities(), DEFAULT_BAND_LINES);
    let bands = renderer.render(panel, background, |band| {
        Text::with_text_style(LABEL, center, font, layout).draw(band)?;
        Ok(())
    })?;
    Ok(bands)
}
