use geo::EuclideanDistance;
use geo_types::{coord, LineString, Rect};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn to_geo(self) -> geo_types::Point<f64> {
        geo_types::Point::new(self.x, self.y)
    }
}

/// Axis-aligned rectangle. Corners are normalized on construction, so
/// `top_left` is never right of or below `bottom_right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(from = "RectangleCorners")]
pub struct Rectangle {
    top_left: Point,
    bottom_right: Point,
}

#[derive(Deserialize)]
struct RectangleCorners {
    top_left: Point,
    bottom_right: Point,
}

impl From<RectangleCorners> for Rectangle {
    fn from(corners: RectangleCorners) -> Self {
        Rectangle::new(corners.top_left, corners.bottom_right)
    }
}

impl Rectangle {
    /// Build a rectangle from any two opposite corners.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            top_left: Point::new(a.x.min(b.x), a.y.min(b.y)),
            bottom_right: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_xyxy(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.top_left.x + self.bottom_right.x) / 2.0,
            (self.top_left.y + self.bottom_right.y) / 2.0,
        )
    }

    /// Convert to a geo-types rect for geometric operations
    pub fn to_geo_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.top_left.x, y: self.top_left.y },
            coord! { x: self.bottom_right.x, y: self.bottom_right.y },
        )
    }

    /// The closed outline of the rectangle.
    pub fn boundary(&self) -> LineString<f64> {
        self.to_geo_rect().to_polygon().exterior().clone()
    }

    /// Shortest distance from `point` to the rectangle's outline. Points
    /// inside the rectangle measure to the nearest edge, not zero.
    pub fn boundary_distance(&self, point: &Point) -> f64 {
        point.to_geo().euclidean_distance(&self.boundary())
    }
}

/// A recognized string and where it sits in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextBlock {
    pub text: String,
    pub coordinates: Rectangle,
}

/// A directed line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Arrow {
    pub start: Point,
    pub end: Point,
}

impl Arrow {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// Directed link between two boxes, inferred from an arrow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    pub source: Rectangle,
    pub destination: Rectangle,
}

/// Everything one analysis produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub texts: Vec<TextBlock>,
    pub boxes: Vec<Rectangle>,
    pub arrows: Vec<Arrow>,
    pub relationships: Vec<Relationship>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
            && self.boxes.is_empty()
            && self.arrows.is_empty()
            && self.relationships.is_empty()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
