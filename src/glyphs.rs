/*
 *  glyphs.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Packed 1bpp glyph strips and the boot animation
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

use crate::display::traits::Bitmap;

/// Helper function to get a slice for a specific glyph from a binary set
pub fn get_glyph_slice(raw_glyph: &'static [u8], index: usize, w: u32, h: u32) -> Option<&'static [u8]> {
    let byte_size = (w as usize).div_ceil(8) * h as usize;
    let start_idx = index * byte_size;
    raw_glyph.get(start_idx..start_idx + byte_size)
}

/// Intro animation frame dimensions
pub const INTRO_WIDTH: u32 = 32;
pub const INTRO_HEIGHT: u32 = 32;

/// 'intro', 8 frames of 32x32, a dot orbiting the hole
const INTRO_RAW_DATA: &[u8] = include_bytes!("../data/intro_32x32.bin");

pub const INTRO_FRAME_COUNT: usize =
    INTRO_RAW_DATA.len() / ((INTRO_WIDTH as usize / 8) * INTRO_HEIGHT as usize);

/// Frame `index` of the intro animation, wrapping
pub fn intro_frame(index: usize) -> Option<Bitmap> {
    get_glyph_slice(INTRO_RAW_DATA, index % INTRO_FRAME_COUNT, INTRO_WIDTH, INTRO_HEIGHT)
        .map(|data| Bitmap { data, width: INTRO_WIDTH, height: INTRO_HEIGHT })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intro_strip_has_eight_frames() {
        assert_eq!(INTRO_FRAME_COUNT, 8);
        let first = intro_frame(0).unwrap();
        let wrapped = intro_frame(8).unwrap();
        assert_eq!(first.data, wrapped.data);
        assert_eq!(first.data.len(), 128);
    }

    #[test]
    fn test_glyph_slice_out_of_range() {
        assert!(get_glyph_slice(INTRO_RAW_DATA, 8, INTRO_WIDTH, INTRO_HEIGHT).is_none());
    }
}
