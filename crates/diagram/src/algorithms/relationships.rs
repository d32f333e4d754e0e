use tracing::{debug, warn};

use crate::{
    config::RelationshipConfig,
    types::{Arrow, Point, Rectangle, Relationship, TextBlock},
};

/// Relationships inferred from one set of detections, plus the arrows that
/// could not be attached to two distinct boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub relationships: Vec<Relationship>,
    pub orphans: Vec<Arrow>,
}

/// Links arrow endpoints to the boxes they touch.
///
/// Each endpoint attaches to the box whose outline is nearest, provided it is
/// within `proximity_threshold`. On equal distances the box listed first wins.
#[derive(Debug, Clone)]
pub struct RelationshipCalculator {
    pub proximity_threshold: f64,
}

impl Default for RelationshipCalculator {
    fn default() -> Self {
        Self::from_config(&RelationshipConfig::default())
    }
}

impl RelationshipCalculator {
    pub fn new(proximity_threshold: f64) -> Self {
        Self { proximity_threshold }
    }

    pub fn from_config(config: &RelationshipConfig) -> Self {
        Self::new(config.proximity_threshold)
    }

    /// Index of the box nearest to `point`, if any lies within the threshold
    fn nearest_box(&self, point: &Point, boxes: &[Rectangle]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, rect) in boxes.iter().enumerate() {
            let distance = rect.boundary_distance(point);
            if distance > self.proximity_threshold {
                continue;
            }
            // Strict comparison keeps the earliest box on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Resolve every arrow, keeping the orphans.
    pub fn resolve(&self, boxes: &[Rectangle], arrows: &[Arrow]) -> Resolution {
        let mut resolution = Resolution::default();

        for arrow in arrows {
            let source = self.nearest_box(&arrow.start, boxes);
            let destination = self.nearest_box(&arrow.end, boxes);

            match (source, destination) {
                (Some(s), Some(d)) if s != d => resolution.relationships.push(Relationship {
                    source: boxes[s],
                    destination: boxes[d],
                }),
                _ => {
                    debug!(?arrow, ?source, ?destination, "orphan arrow");
                    resolution.orphans.push(*arrow);
                }
            }
        }

        resolution
    }

    /// Relationships for the given detections. Text does not take part in
    /// the geometry.
    pub fn calculate(
        &self,
        _texts: &[TextBlock],
        boxes: &[Rectangle],
        arrows: &[Arrow],
    ) -> Vec<Relationship> {
        let resolution = self.resolve(boxes, arrows);
        if !resolution.orphans.is_empty() {
            warn!(
                orphans = resolution.orphans.len(),
                arrows = arrows.len(),
                "arrows without two distinct boxes were discarded"
            );
        }
        resolution.relationships
    }
}
