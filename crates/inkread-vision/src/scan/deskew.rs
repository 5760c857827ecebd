// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew correction from the minimum-area rectangle around the foreground.
//
// Angles are in degrees. A positive rotation turns the image counter-clockwise
// as seen on screen (y axis pointing down).

use image::{GrayImage, Luma};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::{debug, instrument, warn};

use super::threshold::otsu_threshold;

/// Rotations smaller than this are treated as "already upright".
const MIN_ROTATION_DEG: f64 = 1e-3;

/// Foreground pixels are those at or below the Otsu threshold (dark ink on a
/// light page). Only the leftmost and rightmost foreground pixel of each row
/// can lie on the convex hull, so those are all we keep.
fn foreground_extremes(gray: &GrayImage) -> Vec<Point<i32>> {
    let threshold = otsu_threshold(gray);
    let mut points = Vec::new();
    for (y, row) in gray.rows().enumerate() {
        let mut first = None;
        let mut last = None;
        for (x, pixel) in row.enumerate() {
            if pixel.0[0] <= threshold {
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point::new(first as i32, y as i32));
            if last != first {
                points.push(Point::new(last as i32, y as i32));
            }
        }
    }
    points
}

/// Rotation (degrees) that brings the dominant text direction back to
/// horizontal, or `None` when there is nothing to measure.
///
/// The rectangle's orientation is first expressed in `[-90, 0)` and then
/// folded: below -45 the correction is `-(90 + angle)`, otherwise `-angle`.
pub fn estimate_skew(gray: &GrayImage) -> Option<f64> {
    let points = foreground_extremes(gray);
    if points.is_empty() {
        debug!("No foreground pixels");
        return None;
    }

    let corners = min_area_rect(&points);
    let (a, b) = (corners[0], corners[1]);
    if a == b {
        debug!(points = points.len(), "Foreground too small to orient");
        return None;
    }

    let edge_angle = f64::from(b.y - a.y).atan2(f64::from(b.x - a.x)).to_degrees();
    let reported = -edge_angle.rem_euclid(90.0);
    let correction = if reported < -45.0 {
        -(90.0 + reported)
    } else {
        -reported
    };
    correction.is_finite().then_some(correction)
}

/// Rotate about the image centre with bilinear sampling. Samples that fall
/// outside the frame take the nearest edge pixel.
pub fn rotate_replicate(gray: &GrayImage, degrees: f64) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (max_x, max_y) = ((w - 1) as f64, (h - 1) as f64);

    GrayImage::from_fn(w, h, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        let sx = (cos * dx - sin * dy + cx).clamp(0.0, max_x);
        let sy = (sin * dx + cos * dy + cy).clamp(0.0, max_y);

        let (x0, y0) = (sx.floor() as u32, sy.floor() as u32);
        let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
        let (fx, fy) = (sx - x0 as f64, sy - y0 as f64);
        let px = |px: u32, py: u32| gray.get_pixel(px, py).0[0] as f64;

        let top = px(x0, y0) * (1.0 - fx) + px(x1, y0) * fx;
        let bottom = px(x0, y1) * (1.0 - fx) + px(x1, y1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Straighten skewed text. Best effort: when no angle can be measured the
/// input comes back unchanged.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn deskew(gray: &GrayImage) -> GrayImage {
    match estimate_skew(gray) {
        Some(angle) if angle.abs() >= MIN_ROTATION_DEG => {
            debug!(angle, "Rotating to correct skew");
            rotate_replicate(gray, angle)
        }
        Some(angle) => {
            debug!(angle, "Image already upright");
            gray.clone()
        }
        None => {
            warn!("No measurable foreground; skipping skew correction");
            gray.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with a thick dark horizontal bar.
    fn upright_bar() -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 200, Luma([255u8]));
        for y in 94..106 {
            for x in 30..170 {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
        img
    }

    #[test]
    fn single_dark_pixel_cannot_be_oriented() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([255u8]));
        img.put_pixel(9, 11, Luma([0u8]));
        assert_eq!(estimate_skew(&img), None);
        assert_eq!(deskew(&img), img);
    }

    #[test]
    fn thin_line_is_measured_along_its_length() {
        let mut img = GrayImage::from_pixel(40, 20, Luma([255u8]));
        for x in 5..35 {
            img.put_pixel(x, 10, Luma([0u8]));
        }
        let angle = estimate_skew(&img).unwrap();
        assert!(angle.abs() < 1e-9, "angle {angle}");
    }

    #[test]
    fn upright_bar_needs_no_rotation() {
        let angle = estimate_skew(&upright_bar()).unwrap();
        assert!(angle.abs() < 1e-9, "angle {angle}");
    }

    #[test]
    fn counter_clockwise_skew_is_corrected_clockwise() {
        let skewed = rotate_replicate(&upright_bar(), 5.0);
        let angle = estimate_skew(&skewed).unwrap();
        assert!((angle + 5.0).abs() < 1.0, "angle {angle}");
    }

    #[test]
    fn clockwise_skew_is_corrected_counter_clockwise() {
        let skewed = rotate_replicate(&upright_bar(), -7.0);
        let angle = estimate_skew(&skewed).unwrap();
        assert!((angle - 7.0).abs() < 1.0, "angle {angle}");
    }

    #[test]
    fn blank_page_is_returned_unchanged() {
        let img = GrayImage::from_pixel(50, 40, Luma([255u8]));
        assert_eq!(estimate_skew(&img), None);
        assert_eq!(deskew(&img), img);
    }

    #[test]
    fn deskew_is_idempotent_on_upright_content() {
        let img = upright_bar();
        let once = deskew(&img);
        let twice = deskew(&once);
        assert_eq!(once, img);
        assert_eq!(twice, img);
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = GrayImage::from_fn(31, 17, |x, y| Luma([((x * 8 + y * 3) % 256) as u8]));
        assert_eq!(rotate_replicate(&img, 0.0), img);
    }

    #[test]
    fn rotation_replicates_borders() {
        // A uniform image stays uniform under any rotation.
        let img = GrayImage::from_pixel(40, 30, Luma([180u8]));
        let out = rotate_replicate(&img, 13.0);
        assert!(out.pixels().all(|p| p.0[0] == 180));
    }
}
