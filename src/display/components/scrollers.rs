/*
 *  display/components/scrollers.rs
 *
 *  holemon - the hole at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Horizontal scrolling for lines wider than the panel
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

use crate::display::error::DisplayError;
use crate::display::traits::{DrawingSurface, FontId};

/// Horizontal offset of a line for this tick.
///
/// A line that fits gets 0. A wider one slides left so that its tail
/// reaches the right edge as the tick wraps, then snaps back.
pub fn scroll_offset(text_width: i32, display_width: i32, tick: u32, fps: u32) -> i32 {
    if text_width <= display_width || fps == 0 {
        return 0;
    }
    let overflow = (text_width - display_width) as i64;
    -((tick as i64 * overflow) / fps as i64) as i32
}

/// Draw `text` at (x, y), scrolled when it does not fit between `x` and
/// the right edge of the panel
pub fn draw_scrolling<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    text: &str,
    font: FontId,
    tick: u32,
    fps: u32,
) -> Result<(), DisplayError> {
    let (width, _) = surface.size();
    let text_width = surface.measure_text_width(text, font);
    let offset = scroll_offset(text_width as i32, width as i32 - x, tick, fps);
    surface.draw_text(x + offset, y, text, font)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::traits::Bitmap;

    /// Remembers where text went, 5 px per character
    struct TextLog {
        drawn: Vec<(i32, String)>,
    }

    impl DrawingSurface for TextLog {
        fn size(&self) -> (u32, u32) { (128, 32) }
        fn clear(&mut self) -> Result<(), DisplayError> { Ok(()) }
        fn draw_text(&mut self, x: i32, _y: i32, text: &str, _font: FontId) -> Result<(), DisplayError> {
            self.drawn.push((x, text.to_string()));
            Ok(())
        }
        fn measure_text_width(&self, text: &str, _font: FontId) -> u32 { text.chars().count() as u32 * 5 }
        fn draw_rect(&mut self, _x0: i32, _y0: i32, _x1: i32, _y1: i32, _filled: bool) -> Result<(), DisplayError> { Ok(()) }
        fn draw_line(&mut self, _x0: i32, _y0: i32, _x1: i32, _y1: i32) -> Result<(), DisplayError> { Ok(()) }
        fn draw_bitmap(&mut self, _x: i32, _y: i32, _bitmap: &Bitmap) -> Result<(), DisplayError> { Ok(()) }
        fn present(&mut self) -> Result<(), DisplayError> { Ok(()) }
    }

    #[test]
    fn test_narrow_text_never_moves() {
        for tick in 0..30 {
            assert_eq!(scroll_offset(100, 128, tick, 30), 0);
            assert_eq!(scroll_offset(128, 128, tick, 30), 0);
        }
    }

    #[test]
    fn test_wide_text_walks_left() {
        assert_eq!(scroll_offset(200, 128, 0, 30), 0);
        assert_eq!(scroll_offset(200, 128, 15, 30), -36);
        assert_eq!(scroll_offset(200, 128, 29, 30), -69);

        let mut previous = 1;
        for tick in 0..30 {
            let offset = scroll_offset(200, 128, tick, 30);
            assert!(offset < previous);
            previous = offset;
        }
    }

    #[test]
    fn test_indented_line_scrolls_over_the_remaining_width() {
        let mut log = TextLog { drawn: Vec::new() };
        // 120 px fits the panel but not the 116 px right of the badge
        let line = "x".repeat(24);
        draw_scrolling(&mut log, 12, 0, &line, FontId::Small, 0, 30).unwrap();
        draw_scrolling(&mut log, 12, 0, &line, FontId::Small, 29, 30).unwrap();
        draw_scrolling(&mut log, 0, 0, &line, FontId::Small, 29, 30).unwrap();
        let xs: Vec<i32> = log.drawn.iter().map(|(x, _)| *x).collect();
        assert_eq!(xs, vec![12, 9, 0]);
    }
}
