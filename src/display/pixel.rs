/*
 *  display/pixel.rs
 *
 *  spipanel - SPI display panel driver
 *  (c) 2026 spipanel contributors
 *
 *  Pixel packing into the controller wire format
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

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::{Rgb565, Rgb666, RgbColor};

use crate::display::panel::PixelFormat;
use crate::display::region::FlushRegion;

/// Bytes a region occupies in the given format
pub fn buffer_len(region: &FlushRegion, format: PixelFormat) -> usize {
    region.pixel_count() * format.bytes_per_pixel()
}

/// RGB565, most significant byte first
#[inline]
pub fn pack_rgb565(color: Rgb565) -> [u8; 2] {
    RawU16::from(color).into_inner().to_be_bytes()
}

/// RGB666, one byte per channel with the 6 bits left-aligned
#[inline]
pub fn pack_rgb666(color: Rgb666) -> [u8; 3] {
    [color.r() << 2, color.g() << 2, color.b() << 2]
}

/// Appends `colors` to `out` in the wire format of `format`
pub fn pack_into<I>(colors: I, format: PixelFormat, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = Rgb565>,
{
    match format {
        PixelFormat::Rgb565 => {
            for color in colors {
                out.extend_from_slice(&pack_rgb565(color));
            }
        }
        PixelFormat::Rgb666 => {
            for color in colors {
                out.extend_from_slice(&pack_rgb666(Rgb666::from(color)));
            }
        }
    }
}

/// Swaps each RGB565 byte pair in place
///
/// Converts between native little-endian `u16` pixels and the big-endian
/// order the controller latches. A trailing odd byte is left untouched.
pub fn swap_rgb565_bytes(buf: &mut [u8]) {
    for pair in buf.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}
