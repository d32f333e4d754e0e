use diagram::{
    algorithms::TextDetector,
    Analyzer, AnalyzerConfig, Detectors, DiagramError, OcrEngine, RecognizedWord, Rectangle,
    Relationship, Result,
};
use image::{GrayImage, Rgb, RgbImage};

const INK: Rgb<u8> = Rgb([20, 20, 20]);

/// OCR stand-in returning a fixed set of words
struct CannedOcr(Vec<RecognizedWord>);

impl OcrEngine for CannedOcr {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<RecognizedWord>> {
        Ok(self.0.clone())
    }
}

fn label(text: &str, left: u32, top: u32) -> RecognizedWord {
    RecognizedWord {
        text: text.to_string(),
        left,
        top,
        width: 24,
        height: 10,
        confidence: 90.0,
        line_key: (1, 1, top),
    }
}

fn analyzer(words: Vec<RecognizedWord>) -> Analyzer {
    let config = AnalyzerConfig::default();
    let detectors = Detectors::from_config(&config)
        .with_text_detector(TextDetector::new(CannedOcr(words)));
    Analyzer::from_config_with_detectors(&config, detectors).expect("default config is valid")
}

fn canvas(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([250, 250, 250]))
}

fn draw_box(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
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

/// Horizontal arrow with its head at `tip_x`; the shaft runs from `from_x`
fn draw_arrow(img: &mut RgbImage, from_x: u32, tip_x: u32, y: u32) {
    let (lo, hi) = (from_x.min(tip_x), from_x.max(tip_x));
    for x in lo..=hi {
        img.put_pixel(x, y, INK);
    }
    for d in 0..=6u32 {
        let half = (d * 4) / 5;
        let x = if tip_x > from_x { tip_x - d } else { tip_x + d };
        for dy in 0..=half {
            img.put_pixel(x, y + dy, INK);
            img.put_pixel(x, y - dy, INK);
        }
    }
}

fn two_box_diagram(pointing_right: bool) -> RgbImage {
    let mut img = canvas(240, 120);
    draw_box(&mut img, 20, 30, 80, 90);
    draw_box(&mut img, 160, 30, 220, 90);
    if pointing_right {
        draw_arrow(&mut img, 86, 152, 60);
    } else {
        draw_arrow(&mut img, 154, 88, 60);
    }
    img
}

fn left_and_right(boxes: &[Rectangle]) -> (Rectangle, Rectangle) {
    assert_eq!(boxes.len(), 2, "boxes: {boxes:?}");
    if boxes[0].top_left().x < boxes[1].top_left().x {
        (boxes[0], boxes[1])
    } else {
        (boxes[1], boxes[0])
    }
}

#[test]
fn two_boxes_one_arrow_yield_one_relationship() {
    let result = analyzer(vec![label("A", 30, 50), label("B", 170, 50)])
        .analyze_image(&two_box_diagram(true).into())
        .expect("Should analyze diagram");

    let (a, b) = left_and_right(&result.boxes);
    assert_eq!(a, Rectangle::from_xyxy(20.0, 30.0, 80.0, 90.0));
    assert_eq!(b, Rectangle::from_xyxy(160.0, 30.0, 220.0, 90.0));
    assert_eq!(result.arrows.len(), 1, "arrows: {:?}", result.arrows);
    assert_eq!(result.texts.len(), 2);
    assert_eq!(
        result.relationships,
        vec![Relationship { source: a, destination: b }]
    );
}

#[test]
fn reversed_arrow_reverses_relationship() {
    let result = analyzer(Vec::new())
        .analyze_image(&two_box_diagram(false).into())
        .expect("Should analyze diagram");

    let (a, b) = left_and_right(&result.boxes);
    assert_eq!(
        result.relationships,
        vec![Relationship { source: b, destination: a }]
    );
}

#[test]
fn blank_image_yields_nothing() {
    let result = analyzer(Vec::new())
        .analyze_image(&canvas(160, 100).into())
        .expect("Should analyze blank image");

    assert!(result.texts.is_empty());
    assert!(result.boxes.is_empty());
    assert!(result.arrows.is_empty());
    assert!(result.relationships.is_empty());
}

#[test]
fn single_box_has_no_relationships() {
    let mut img = canvas(160, 120);
    draw_box(&mut img, 30, 20, 130, 100);

    let result = analyzer(vec![label("Service", 50, 50)])
        .analyze_image(&img.into())
        .expect("Should analyze diagram");

    assert_eq!(result.boxes.len(), 1);
    assert!(result.arrows.is_empty(), "arrows: {:?}", result.arrows);
    assert_eq!(result.texts.len(), 1);
    assert!(result.relationships.is_empty());
}

#[test]
fn arrow_without_boxes_is_orphaned() {
    let mut img = canvas(200, 80);
    draw_arrow(&mut img, 30, 160, 40);

    let result = analyzer(Vec::new())
        .analyze_image(&img.into())
        .expect("Should analyze diagram");

    assert_eq!(result.arrows.len(), 1);
    assert!(result.relationships.is_empty());
}

#[test]
fn parallel_and_sequential_detection_agree() {
    let image = two_box_diagram(true).into();
    let parallel = analyzer(Vec::new()).analyze_image(&image).expect("parallel run");
    let sequential = analyzer(Vec::new())
        .with_parallel_detection(false)
        .analyze_image(&image)
        .expect("sequential run");

    assert_eq!(parallel, sequential);
}

#[test]
fn analyze_reads_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("diagram.png");
    two_box_diagram(true).save(&path).expect("write png");

    let result = analyzer(Vec::new()).analyze(&path).expect("Should analyze file");
    assert_eq!(result.relationships.len(), 1);
}

#[test]
fn unreadable_file_is_decode_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not an image").expect("write file");

    let err = analyzer(Vec::new()).analyze(&path).unwrap_err();
    assert!(matches!(err, DiagramError::Decode { .. }), "error: {err}");
}
