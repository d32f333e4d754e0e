use geo::{Area, BoundingRect, Simplify};
use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};

use crate::types::Rectangle;

/// Intensity below which a pixel counts as ink.
pub const INK_THRESHOLD: u8 = 128;

/// Turn a dark-on-light image into a mask where ink is 255 and paper is 0.
pub fn ink_mask(image: &GrayImage) -> GrayImage {
    imageproc::map::map_colors(image, |p| {
        if p[0] < INK_THRESHOLD {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Imageproc-based contour extractor keeping outer borders only
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ImageprocContourExtractor {
    /// Outer contours of every connected ink component in `mask`
    pub fn extract_outer_contours(&self, mask: &GrayImage) -> Vec<Vec<[f64; 2]>> {
        find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .map(|contour| {
                contour
                    .points
                    .iter()
                    .map(|p| [f64::from(p.x), f64::from(p.y)])
                    .collect()
            })
            .collect()
    }
}

/// A contour reduced to a closed polygon.
#[derive(Debug, Clone)]
pub struct ApproximatedShape {
    pub polygon: Polygon<f64>,
}

impl ApproximatedShape {
    /// Distinct vertices of the polygon (the closing point is not counted)
    pub fn vertex_count(&self) -> usize {
        self.polygon.exterior().0.len().saturating_sub(1)
    }

    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    pub fn bounding_rectangle(&self) -> Option<Rectangle> {
        self.polygon
            .bounding_rect()
            .map(|r| Rectangle::from_xyxy(r.min().x, r.min().y, r.max().x, r.max().y))
    }
}

/// Approximate a closed contour with Douglas-Peucker, using a tolerance
/// proportional to the contour's perimeter.
///
/// The ring is rotated to start at its top-left-most point so that an
/// axis-aligned box always starts on a corner.
pub fn approximate_polygon(contour: &[[f64; 2]], epsilon_fraction: f64) -> Option<ApproximatedShape> {
    if contour.len() < 3 {
        return None;
    }

    let start = contour
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a[0] + a[1])
                .partial_cmp(&(b[0] + b[1]))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut coords: Vec<Coord<f64>> = contour[start..]
        .iter()
        .chain(contour[..start].iter())
        .map(|&[x, y]| Coord { x, y })
        .collect();
    coords.push(coords[0]);

    let ring = LineString::new(coords);
    let perimeter: f64 = ring
        .lines()
        .map(|line| line.dx().hypot(line.dy()))
        .sum();
    let simplified = ring.simplify(&(perimeter * epsilon_fraction));

    if simplified.0.len() < 4 {
        return None;
    }

    Some(ApproximatedShape {
        polygon: Polygon::new(simplified, vec![]),
    })
}
