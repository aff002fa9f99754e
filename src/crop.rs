// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Rubber-band crop selection over a displayed image.
//!
//! All coordinates here are source-image pixels. The view maps pointer
//! positions through [`ImageViewport`] before handing them to [`CropTool`].

use crate::error::{MediaError, Result};
use image::{DynamicImage, RgbaImage};
use log::debug;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with a normalized origin and non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// The rectangle spanning two corners, in either order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y)
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlap of two rectangles, `None` when they do not share any area.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left as i32, top as i32, (right - left) as u32, (bottom - top) as u32))
    }
}

/// Pointer-driven selection state.
#[derive(Debug, Clone, Default)]
pub struct CropTool {
    pressed: bool,
    anchor: Point,
    current: Point
}

impl CropTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, at: Point) {
        self.pressed = true;
        self.anchor = at;
        self.current = at;
    }

    /// Starts a drag that was only recognised once the pointer reached `current`.
    pub fn begin(&mut self, origin: Point, current: Point) {
        self.press(origin);
        self.current = current;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Returns `true` when the overlay needs repainting.
    pub fn drag(&mut self, to: Point) -> bool {
        if !self.pressed {
            return false;
        }
        let changed = self.current != to;
        self.current = to;
        changed
    }

    /// Finishes the drag and clears the selection.
    pub fn release(&mut self, at: Point) -> Option<Rect> {
        if !self.pressed {
            debug!("Crop release without press");
            return None;
        }
        let rect = Rect::from_corners(self.anchor, at);
        self.cancel();
        Some(rect)
    }

    pub fn cancel(&mut self) {
        self.pressed = false;
        self.anchor = Point::default();
        self.current = Point::default();
    }

    /// Rectangle to draw as the overlay, while the pointer is held.
    pub fn selection(&self) -> Option<Rect> {
        if !self.pressed {
            return None;
        }
        let rect = Rect::from_corners(self.anchor, self.current);
        (!rect.is_empty()).then_some(rect)
    }
}

/// Copies the part of `image` covered by `selection`.
pub fn crop_image(image: &RgbaImage, selection: Rect) -> Option<RgbaImage> {
    let bounds = Rect::new(0, 0, image.width(), image.height());
    let Some(valid) = selection.intersect(&bounds) else {
        debug!("Invalid crop rectangle {:?} for {}x{} image", selection, image.width(), image.height());
        return None;
    };
    let view = image::imageops::crop_imm(image, valid.x as u32, valid.y as u32, valid.width, valid.height);
    Some(view.to_image())
}

/// Writes an RGBA image, dropping alpha for formats that cannot store it.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default();
    let result = match ext.as_str() {
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path),
        _ => image.save(path)
    };
    result.map_err(|source| MediaError::ImageSave { path: path.to_path_buf(), source })
}

/// Uniform scale that fits `(width, height)` inside `(max_w, max_h)`.
pub fn fit_scale(width: u32, height: u32, max_w: f32, max_h: f32) -> f32 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    (max_w / width as f32).min(max_h / height as f32)
}

/// Placement of an image on screen: top-left corner and scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageViewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub scale: f32
}

impl ImageViewport {
    pub fn to_image(&self, x: f32, y: f32) -> Point {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        Point::new(((x - self.origin_x) / scale).round() as i32, ((y - self.origin_y) / scale).round() as i32)
    }

    /// Screen-space `(x, y, w, h)` of an image-space rectangle.
    pub fn to_screen(&self, rect: Rect) -> (f32, f32, f32, f32) {
        (
            self.origin_x + rect.x as f32 * self.scale,
            self.origin_y + rect.y as f32 * self.scale,
            rect.width as f32 * self.scale,
            rect.height as f32 * self.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn checkerboard(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, ((x + y) % 2 * 255) as u8, 255]))
    }

    #[test]
    fn corners_are_order_independent() {
        let pairs = [
            (Point::new(3, 4), Point::new(10, 20)),
            (Point::new(-5, 7), Point::new(2, -9)),
            (Point::new(0, 0), Point::new(0, 0))
        ];
        for (a, b) in pairs {
            assert_eq!(Rect::from_corners(a, b), Rect::from_corners(b, a));
        }
        assert_eq!(Rect::from_corners(Point::new(10, 20), Point::new(3, 4)), Rect::new(3, 4, 7, 16));
    }

    #[test]
    fn intersection_stays_inside_bounds() {
        let bounds = Rect::new(0, 0, 100, 50);
        let candidates = [
            Rect::new(-20, -20, 50, 50),
            Rect::new(90, 40, 30, 30),
            Rect::new(10, 10, 5, 5),
            Rect::new(-1000, -1000, 5000, 5000)
        ];
        for rect in candidates {
            let hit = rect.intersect(&bounds).expect("overlapping rectangles intersect");
            assert!(hit.x >= 0 && hit.y >= 0);
            assert!(hit.right() <= bounds.right() && hit.bottom() <= bounds.bottom());
        }
    }

    #[test]
    fn disjoint_or_empty_rectangles_do_not_intersect() {
        let bounds = Rect::new(0, 0, 100, 50);
        assert_eq!(Rect::new(200, 0, 10, 10).intersect(&bounds), None);
        assert_eq!(Rect::new(100, 0, 10, 10).intersect(&bounds), None);
        assert_eq!(Rect::new(10, 10, 0, 10).intersect(&bounds), None);
    }

    #[test]
    fn drag_builds_selection_and_release_clears_it() {
        let mut tool = CropTool::new();
        assert_eq!(tool.selection(), None);
        assert!(!tool.drag(Point::new(5, 5)));

        tool.press(Point::new(10, 10));
        assert_eq!(tool.selection(), None);
        assert!(tool.drag(Point::new(4, 30)));
        assert_eq!(tool.selection(), Some(Rect::new(4, 10, 6, 20)));

        assert_eq!(tool.release(Point::new(2, 2)), Some(Rect::new(2, 2, 8, 8)));
        assert!(!tool.drag(Point::new(9, 9)));
        assert_eq!(tool.selection(), None);
    }

    #[test]
    fn pointer_hold_ends_on_release_or_cancel() {
        let mut tool = CropTool::new();
        assert!(!tool.is_pressed());
        tool.press(Point::new(3, 3));
        assert!(tool.is_pressed());
        tool.release(Point::new(8, 8));
        assert!(!tool.is_pressed());

        tool.press(Point::new(3, 3));
        tool.cancel();
        assert!(!tool.is_pressed());
        assert_eq!(tool.selection(), None);
    }

    #[test]
    fn late_drag_start_keeps_the_pointer_down_anchor() {
        let mut tool = CropTool::new();
        tool.begin(Point::new(100, 100), Point::new(106, 104));
        assert!(tool.is_pressed());
        assert_eq!(tool.selection(), Some(Rect::new(100, 100, 6, 4)));
        assert_eq!(tool.release(Point::new(120, 110)), Some(Rect::new(100, 100, 20, 10)));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut tool = CropTool::new();
        assert_eq!(tool.release(Point::new(1, 1)), None);
    }

    #[test]
    fn crop_copies_the_selected_pixels() {
        let img = checkerboard(20, 10);
        let cropped = crop_image(&img, Rect::new(5, 2, 4, 3)).expect("inside image");
        assert_eq!(cropped.dimensions(), (4, 3));
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(5, 2));
        assert_eq!(cropped.get_pixel(3, 2), img.get_pixel(8, 4));
    }

    #[test]
    fn crop_is_clamped_to_the_image() {
        let img = checkerboard(20, 10);
        let cropped = crop_image(&img, Rect::new(15, 5, 100, 100)).expect("partially inside");
        assert_eq!(cropped.dimensions(), (5, 5));
        assert_eq!(crop_image(&img, Rect::new(30, 30, 5, 5)), None);
        assert_eq!(crop_image(&img, Rect::new(3, 3, 0, 0)), None);
    }

    #[test]
    fn viewport_maps_between_screen_and_image() {
        let viewport = ImageViewport { origin_x: 100.0, origin_y: 50.0, scale: 0.5 };
        assert_eq!(viewport.to_image(110.0, 60.0), Point::new(20, 20));
        assert_eq!(viewport.to_screen(Rect::new(20, 20, 40, 10)), (110.0, 60.0, 20.0, 5.0));
    }

    #[test]
    fn fit_scale_keeps_aspect_ratio() {
        assert_eq!(fit_scale(400, 200, 200.0, 200.0), 0.5);
        assert_eq!(fit_scale(100, 400, 200.0, 200.0), 0.5);
        assert_eq!(fit_scale(0, 10, 200.0, 200.0), 1.0);
    }

    #[test]
    fn save_image_writes_jpeg_without_alpha() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("crop.jpg");
        save_image(&checkerboard(8, 8), &path).expect("jpeg save");
        let reopened = image::open(&path).expect("reopen");
        assert_eq!((reopened.width(), reopened.height()), (8, 8));
    }

    #[test]
    fn save_image_reports_unknown_extension() {
        let dir = tempdir().expect("failed to create temp dir");
        let err = save_image(&checkerboard(2, 2), &dir.path().join("crop.nope")).unwrap_err();
        assert!(matches!(err, MediaError::ImageSave { .. }));
    }
}
