use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

use crate::{error::Result, traits::LineSegmentDetector, types::Point};

/// Perpendicular slack when walking a Hough line, absorbing the accumulator's
/// integer rounding of `r`.
const WALK_TOLERANCE: i32 = 1;

/// Hough-transform segment extractor.
///
/// `detect_lines` yields infinite polar lines; each one is walked across the
/// image and split into runs of foreground pixels. Gaps of at most `max_gap`
/// pixels are bridged, and runs shorter than `min_length` are dropped.
#[derive(Debug, Clone)]
pub struct HoughSegmentDetector {
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_length: f64,
    pub max_gap: u32,
}

impl Default for HoughSegmentDetector {
    fn default() -> Self {
        Self {
            vote_threshold: 40,
            suppression_radius: 8,
            min_length: 20.0,
            max_gap: 2,
        }
    }
}

impl HoughSegmentDetector {
    fn walk(&self, foreground: &GrayImage, line: &PolarLine) -> Vec<(Point, Point)> {
        let (width, height) = foreground.dimensions();
        let theta = f64::from(line.angle_in_degrees).to_radians();
        let (sin, cos) = theta.sin_cos();
        let r = f64::from(line.r);

        // Foot of the perpendicular from the origin, and the line direction
        let (base_x, base_y) = (r * cos, r * sin);
        let (dir_x, dir_y) = (-sin, cos);

        let is_ink = |x: f64, y: f64| -> bool {
            (-WALK_TOLERANCE..=WALK_TOLERANCE).any(|k| {
                let px = (x + f64::from(k) * cos).round();
                let py = (y + f64::from(k) * sin).round();
                px >= 0.0
                    && py >= 0.0
                    && px < f64::from(width)
                    && py < f64::from(height)
                    && foreground.get_pixel(px as u32, py as u32)[0] > 0
            })
        };

        let reach = f64::from(width).hypot(f64::from(height)).ceil() as i64;
        let point_at = |t: i64| Point::new(base_x + t as f64 * dir_x, base_y + t as f64 * dir_y);

        let mut segments = Vec::new();
        let mut run: Option<(i64, i64)> = None;

        for t in -reach..=reach {
            let p = point_at(t);
            if is_ink(p.x, p.y) {
                run = match run {
                    Some((first, last)) if t - last <= i64::from(self.max_gap) + 1 => Some((first, t)),
                    Some((first, last)) => {
                        segments.push((point_at(first), point_at(last)));
                        Some((t, t))
                    }
                    None => Some((t, t)),
                };
            }
        }
        if let Some((first, last)) = run {
            segments.push((point_at(first), point_at(last)));
        }

        segments
            .into_iter()
            .filter(|(a, b)| a.distance_to(b) >= self.min_length)
            .map(|(a, b)| (Point::new(a.x.round(), a.y.round()), Point::new(b.x.round(), b.y.round())))
            .collect()
    }
}

impl LineSegmentDetector for HoughSegmentDetector {
    fn detect_segments(&self, foreground: &GrayImage) -> Result<Vec<(Point, Point)>> {
        let options = LineDetectionOptions {
            vote_threshold: self.vote_threshold,
            suppression_radius: self.suppression_radius,
        };
        let lines = detect_lines(foreground, options);

        Ok(lines
            .iter()
            .flat_map(|line| self.walk(foreground, line))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_horizontal_stroke_becomes_one_segment() {
        let mut mask = GrayImage::new(120, 60);
        for x in 20..=100 {
            mask.put_pixel(x, 30, Luma([255u8]));
        }

        let segments = HoughSegmentDetector::default()
            .detect_segments(&mask)
            .expect("Should detect lines");

        assert!(!segments.is_empty());
        let (a, b) = segments
            .iter()
            .max_by(|x, y| x.0.distance_to(&x.1).total_cmp(&y.0.distance_to(&y.1)))
            .copied()
            .expect("at least one segment");
        let (left, right) = if a.x < b.x { (a, b) } else { (b, a) };
        assert!((left.x - 20.0).abs() <= 1.0);
        assert!((right.x - 100.0).abs() <= 1.0);
        assert!((left.y - 30.0).abs() <= 1.0);
    }

    #[test]
    fn test_gap_splits_segments() {
        let mut mask = GrayImage::new(160, 40);
        for x in (10..=60).chain(90..=150) {
            mask.put_pixel(x, 20, Luma([255u8]));
        }

        let detector = HoughSegmentDetector {
            vote_threshold: 50,
            ..Default::default()
        };
        let segments = detector.detect_segments(&mask).expect("Should detect lines");

        let horizontal: Vec<_> = segments
            .iter()
            .filter(|(a, b)| (a.y - b.y).abs() < 1.0)
            .collect();
        assert_eq!(horizontal.len(), 2, "segments: {segments:?}");
    }

    #[test]
    fn test_blank_mask_has_no_segments() {
        let segments = HoughSegmentDetector::default()
            .detect_segments(&GrayImage::new(50, 50))
            .expect("Should run on blank input");
        assert!(segments.is_empty());
    }
}
