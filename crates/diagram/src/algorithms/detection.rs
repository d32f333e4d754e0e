use image::GrayImage;
use tracing::debug;

use crate::{
    algorithms::{
        extraction::{approximate_polygon, ink_mask, ImageprocContourExtractor},
        hough::HoughSegmentDetector,
        ocr::TesseractEngine,
    },
    config::{ArrowDetectorConfig, BoxDetectorConfig, TextDetectorConfig, TextGranularity},
    error::Result,
    raster::Image,
    traits::{FeatureDetector, LineSegmentDetector, OcrEngine, RecognizedWord},
    types::{Arrow, Point, Rectangle, TextBlock},
};

/// Text detector backed by an OCR engine
pub struct TextDetector {
    engine: Box<dyn OcrEngine>,
    min_confidence: f32,
    granularity: TextGranularity,
}

impl TextDetector {
    pub fn new<E>(engine: E) -> Self
    where
        E: OcrEngine + 'static,
    {
        Self {
            engine: Box::new(engine),
            min_confidence: 0.0,
            granularity: TextGranularity::Word,
        }
    }

    /// Tesseract-backed detector configured from `config`
    pub fn from_config(config: &TextDetectorConfig) -> Self {
        Self::new(TesseractEngine::from_config(config))
            .with_min_confidence(config.min_confidence)
            .with_granularity(config.granularity)
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_granularity(mut self, granularity: TextGranularity) -> Self {
        self.granularity = granularity;
        self
    }
}

fn word_rectangle(word: &RecognizedWord) -> Rectangle {
    Rectangle::from_xyxy(
        f64::from(word.left),
        f64::from(word.top),
        f64::from(word.left) + f64::from(word.width),
        f64::from(word.top) + f64::from(word.height),
    )
}

fn union(a: &Rectangle, b: &Rectangle) -> Rectangle {
    Rectangle::from_xyxy(
        a.top_left().x.min(b.top_left().x),
        a.top_left().y.min(b.top_left().y),
        a.bottom_right().x.max(b.bottom_right().x),
        a.bottom_right().y.max(b.bottom_right().y),
    )
}

/// Merge words sharing a line key, keeping first-appearance order.
fn group_lines(words: &[RecognizedWord]) -> Vec<TextBlock> {
    let mut lines: Vec<((u32, u32, u32), TextBlock)> = Vec::new();

    for word in words {
        let rect = word_rectangle(word);
        match lines.iter_mut().find(|(key, _)| *key == word.line_key) {
            Some((_, block)) => {
                block.text.push(' ');
                block.text.push_str(&word.text);
                block.coordinates = union(&block.coordinates, &rect);
            }
            None => lines.push((
                word.line_key,
                TextBlock {
                    text: word.text.clone(),
                    coordinates: rect,
                },
            )),
        }
    }

    lines.into_iter().map(|(_, block)| block).collect()
}

impl FeatureDetector for TextDetector {
    type Feature = TextBlock;

    fn name(&self) -> &'static str {
        "text"
    }

    fn detect(&self, image: &Image) -> Result<Vec<TextBlock>> {
        let words: Vec<RecognizedWord> = self
            .engine
            .recognize(&image.to_luma())?
            .into_iter()
            .filter(|w| w.confidence >= self.min_confidence && !w.text.trim().is_empty())
            .collect();

        let blocks = match self.granularity {
            TextGranularity::Word => words
                .iter()
                .map(|w| TextBlock {
                    text: w.text.clone(),
                    coordinates: word_rectangle(w),
                })
                .collect(),
            TextGranularity::Line => group_lines(&words),
        };

        debug!(count = blocks.len(), "text blocks detected");
        Ok(blocks)
    }
}

/// Contour-based box detector
#[derive(Debug, Clone, Default)]
pub struct BoxDetector {
    pub config: BoxDetectorConfig,
}

impl BoxDetector {
    pub fn new(config: BoxDetectorConfig) -> Self {
        Self { config }
    }

    fn accepts(&self, rect: &Rectangle, vertices: usize, area: f64) -> bool {
        let (long, short) = if rect.width() >= rect.height() {
            (rect.width(), rect.height())
        } else {
            (rect.height(), rect.width())
        };

        (self.config.min_vertices..=self.config.max_vertices).contains(&vertices)
            && area >= self.config.min_area
            && short > 0.0
            && long / short <= self.config.max_aspect_ratio
    }

    /// Boxes found in a dark-on-light grayscale image
    pub fn find_boxes(&self, gray: &GrayImage) -> Vec<Rectangle> {
        let mask = ink_mask(gray);

        ImageprocContourExtractor
            .extract_outer_contours(&mask)
            .iter()
            .filter_map(|contour| approximate_polygon(contour, self.config.approximation_epsilon))
            .filter_map(|shape| {
                let rect = shape.bounding_rectangle()?;
                self.accepts(&rect, shape.vertex_count(), shape.area())
                    .then_some(rect)
            })
            .collect()
    }
}

impl FeatureDetector for BoxDetector {
    type Feature = Rectangle;

    fn name(&self) -> &'static str {
        "box"
    }

    fn detect(&self, image: &Image) -> Result<Vec<Rectangle>> {
        let boxes = self.find_boxes(&image.to_luma());
        debug!(count = boxes.len(), "boxes detected");
        Ok(boxes)
    }
}

/// Line-transform arrow detector.
///
/// Candidate segments that lie along the outline of a box are box edges, not
/// arrows. Boxes are located with the detector's own [`BoxDetector`], so
/// arrow detection never depends on another detector's output.
pub struct ArrowDetector {
    segments: Box<dyn LineSegmentDetector>,
    boxes: BoxDetector,
    edge_tolerance: f64,
    head_window: u32,
}

impl ArrowDetector {
    pub fn new<S>(segments: S, boxes: BoxDetector) -> Self
    where
        S: LineSegmentDetector + 'static,
    {
        let defaults = ArrowDetectorConfig::default();
        Self {
            segments: Box::new(segments),
            boxes,
            edge_tolerance: defaults.edge_tolerance,
            head_window: defaults.head_window,
        }
    }

    /// Hough-backed detector configured from `config`
    pub fn from_config(config: &ArrowDetectorConfig, boxes: &BoxDetectorConfig) -> Self {
        let hough = HoughSegmentDetector {
            vote_threshold: config.vote_threshold,
            suppression_radius: config.suppression_radius,
            min_length: config.min_length,
            max_gap: config.max_gap,
        };
        Self {
            segments: Box::new(hough),
            boxes: BoxDetector::new(boxes.clone()),
            edge_tolerance: config.edge_tolerance,
            head_window: config.head_window,
        }
    }

    fn lies_on_box_edge(&self, a: &Point, b: &Point, boxes: &[Rectangle]) -> bool {
        let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        boxes.iter().any(|rect| {
            [a, b, &mid]
                .iter()
                .all(|p| rect.boundary_distance(p) <= self.edge_tolerance)
        })
    }

    /// Ink pixels flanking the segment near `tip`, off the shaft itself.
    /// Arrowheads widen the stroke, so the heavier end is the head.
    fn head_mass(&self, mask: &GrayImage, tip: &Point, tail: &Point) -> usize {
        let length = tip.distance_to(tail);
        if length == 0.0 {
            return 0;
        }
        let (dir_x, dir_y) = ((tail.x - tip.x) / length, (tail.y - tip.y) / length);
        let (normal_x, normal_y) = (-dir_y, dir_x);
        let window = i64::from(self.head_window);
        let reach = (2 * window).min(length as i64);

        let mut mass = 0;
        for t in 0..=reach {
            for k in 2..=window {
                for sign in [-1.0, 1.0] {
                    let offset = sign * k as f64;
                    let x = (tip.x + dir_x * t as f64 + normal_x * offset).round();
                    let y = (tip.y + dir_y * t as f64 + normal_y * offset).round();
                    if x >= 0.0
                        && y >= 0.0
                        && x < f64::from(mask.width())
                        && y < f64::from(mask.height())
                        && mask.get_pixel(x as u32, y as u32)[0] > 0
                    {
                        mass += 1;
                    }
                }
            }
        }
        mass
    }

    fn orient(&self, mask: &GrayImage, a: Point, b: Point) -> Arrow {
        if self.head_mass(mask, &a, &b) > self.head_mass(mask, &b, &a) {
            Arrow::new(b, a)
        } else {
            Arrow::new(a, b)
        }
    }
}

fn same_segment(x: &Arrow, y: &Arrow, tolerance: f64) -> bool {
    let forward = x.start.distance_to(&y.start) <= tolerance && x.end.distance_to(&y.end) <= tolerance;
    let reverse = x.start.distance_to(&y.end) <= tolerance && x.end.distance_to(&y.start) <= tolerance;
    forward || reverse
}

impl FeatureDetector for ArrowDetector {
    type Feature = Arrow;

    fn name(&self) -> &'static str {
        "arrow"
    }

    fn detect(&self, image: &Image) -> Result<Vec<Arrow>> {
        let gray = image.to_luma();
        let mask = ink_mask(&gray);
        let boxes = self.boxes.find_boxes(&gray);

        let candidates = self.segments.detect_segments(&mask)?;
        let candidate_count = candidates.len();

        let mut arrows: Vec<Arrow> = Vec::new();
        for (a, b) in candidates {
            if self.lies_on_box_edge(&a, &b, &boxes) {
                continue;
            }
            let arrow = self.orient(&mask, a, b);
            let duplicate_tolerance = self.edge_tolerance.max(3.0);
            match arrows
                .iter_mut()
                .find(|kept| same_segment(kept, &arrow, duplicate_tolerance))
            {
                Some(kept) if arrow.length() > kept.length() => *kept = arrow,
                Some(_) => {}
                None => arrows.push(arrow),
            }
        }

        debug!(candidates = candidate_count, count = arrows.len(), "arrows detected");
        Ok(arrows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagramError;
    use image::Luma;

    const INK: Luma<u8> = Luma([0u8]);

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255u8]))
    }

    fn draw_outline(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for x in x0..=x1 {
            for t in 0..2 {
                img.put_pixel(x, y0 + t, INK);
                img.put_pixel(x, y1 - t, INK);
            }
        }
        for y in y0..=y1 {
            for t in 0..2 {
                img.put_pixel(x0 + t, y, INK);
                img.put_pixel(x1 - t, y, INK);
            }
        }
    }

    /// Horizontal arrow pointing right, head tip at `x1`
    fn draw_arrow(img: &mut GrayImage, x0: u32, x1: u32, y: u32) {
        for x in x0..=x1 {
            img.put_pixel(x, y, INK);
        }
        for dx in 0..=6u32 {
            let half = (dx * 4) / 5;
            for dy in 0..=half {
                img.put_pixel(x1 - dx, y + dy, INK);
                img.put_pixel(x1 - dx, y - dy, INK);
            }
        }
    }

    struct StubOcr(Vec<RecognizedWord>);

    impl OcrEngine for StubOcr {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<RecognizedWord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<RecognizedWord>> {
            Err(DiagramError::Ocr("engine unavailable".to_string()))
        }
    }

    fn word(text: &str, left: u32, line: u32, confidence: f32) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            left,
            top: 10 * line,
            width: 20,
            height: 8,
            confidence,
            line_key: (1, 1, line),
        }
    }

    #[test]
    fn test_text_words_and_confidence_filter() {
        let detector = TextDetector::new(StubOcr(vec![
            word("Client", 5, 1, 90.0),
            word("noise", 40, 1, 10.0),
            word("Server", 5, 2, 80.0),
        ]))
        .with_min_confidence(50.0);

        let blocks = detector.detect(&Image::from(blank(10, 10))).expect("Should detect");
        let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Client", "Server"]);
        assert_eq!(blocks[0].coordinates, Rectangle::from_xyxy(5.0, 10.0, 25.0, 18.0));
    }

    #[test]
    fn test_text_line_granularity_merges_words() {
        let detector = TextDetector::new(StubOcr(vec![
            word("Load", 5, 1, 90.0),
            word("Balancer", 30, 1, 90.0),
            word("DB", 5, 2, 90.0),
        ]))
        .with_granularity(TextGranularity::Line);

        let blocks = detector.detect(&Image::from(blank(10, 10))).expect("Should detect");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Load Balancer");
        assert_eq!(blocks[0].coordinates, Rectangle::from_xyxy(5.0, 10.0, 50.0, 18.0));
    }

    #[test]
    fn test_text_box_at_coordinate_limit() {
        let mut far = word("edge", u32::MAX - 5, 1, 90.0);
        far.width = 10;
        far.top = u32::MAX - 2;

        let blocks = TextDetector::new(StubOcr(vec![far]))
            .detect(&Image::from(blank(10, 10)))
            .expect("Should detect");
        let rect = blocks[0].coordinates;
        assert_eq!(rect.bottom_right().x, f64::from(u32::MAX) + 5.0);
        assert_eq!(rect.bottom_right().y, f64::from(u32::MAX) + 6.0);
    }

    #[test]
    fn test_text_empty_is_not_an_error() {
        let detector = TextDetector::new(StubOcr(Vec::new()));
        assert!(detector.detect(&Image::from(blank(10, 10))).expect("ok").is_empty());
    }

    #[test]
    fn test_text_engine_failure_propagates() {
        let detector = TextDetector::new(FailingOcr);
        assert!(detector.detect(&Image::from(blank(10, 10))).is_err());
    }

    #[test]
    fn test_boxes_found_and_noise_rejected() {
        let mut img = blank(200, 120);
        draw_outline(&mut img, 10, 10, 70, 60);
        draw_outline(&mut img, 110, 20, 180, 90);
        // Small speck, below the area filter
        draw_outline(&mut img, 150, 100, 156, 106);

        let boxes = BoxDetector::default()
            .detect(&Image::from(img))
            .expect("Should detect boxes");

        assert_eq!(boxes.len(), 2, "boxes: {boxes:?}");
        assert!(boxes.contains(&Rectangle::from_xyxy(10.0, 10.0, 70.0, 60.0)));
        assert!(boxes.contains(&Rectangle::from_xyxy(110.0, 20.0, 180.0, 90.0)));
    }

    #[test]
    fn test_box_aspect_filter() {
        let mut img = blank(300, 60);
        draw_outline(&mut img, 5, 20, 290, 30);

        let strict = BoxDetector::new(BoxDetectorConfig {
            max_aspect_ratio: 5.0,
            ..Default::default()
        });
        assert!(strict.detect(&Image::from(img)).expect("ok").is_empty());
    }

    #[test]
    fn test_box_edges_are_not_arrows() {
        let mut img = blank(200, 120);
        draw_outline(&mut img, 20, 20, 120, 90);

        let arrows = ArrowDetector::from_config(&ArrowDetectorConfig::default(), &BoxDetectorConfig::default())
            .detect(&Image::from(img))
            .expect("Should run");
        assert!(arrows.is_empty(), "arrows: {arrows:?}");
    }

    #[test]
    fn test_free_arrow_points_at_head() {
        let mut img = blank(200, 80);
        draw_arrow(&mut img, 30, 150, 40);

        let arrows = ArrowDetector::from_config(&ArrowDetectorConfig::default(), &BoxDetectorConfig::default())
            .detect(&Image::from(img))
            .expect("Should run");

        assert_eq!(arrows.len(), 1, "arrows: {arrows:?}");
        let arrow = arrows[0];
        assert!(arrow.start.x < arrow.end.x, "arrow should point right: {arrow:?}");
        assert!((arrow.start.x - 30.0).abs() <= 2.0);
        assert!((arrow.end.x - 150.0).abs() <= 2.0);
    }

    struct FailingLines;

    impl LineSegmentDetector for FailingLines {
        fn detect_segments(&self, _foreground: &GrayImage) -> Result<Vec<(Point, Point)>> {
            Err(DiagramError::LineDetection("transform failed".to_string()))
        }
    }

    #[test]
    fn test_line_failure_propagates() {
        let detector = ArrowDetector::new(FailingLines, BoxDetector::default());
        let err = detector.detect(&Image::from(blank(20, 20))).unwrap_err();
        assert!(matches!(err, DiagramError::LineDetection(_)));
    }
}
