use crate::waveform::{PixelCanvas, Rgba, SharedCanvas, Surface};

const RED: Rgba = Rgba([255, 0, 0, 255]);

/// WHAT: The backing grid scales with the device-pixel ratio
/// WHY: High-density screens need sharp traces
#[test]
fn given_ratio_two_when_creating_canvas_then_backing_doubled() {
    // Given/When: A 100x50 canvas at ratio 2
    let canvas = PixelCanvas::new(100.0, 50.0, 2.0);

    // Then: 200x100 device pixels, CSS size unchanged
    assert_eq!((canvas.width(), canvas.height()), (200, 100));
    assert_eq!(canvas.css_size(), (100.0, 50.0));
}

/// WHAT: Rectangles are drawn in CSS pixels
/// WHY: Callers never deal with device pixels
#[test]
fn given_ratio_two_when_filling_rect_then_device_pixels_covered() {
    // Given: A canvas at ratio 2
    let mut canvas = PixelCanvas::new(100.0, 50.0, 2.0);

    // When: Filling a 5x5 CSS rectangle at (10, 10)
    canvas.fill_rect(10.0, 10.0, 5.0, 5.0, RED);

    // Then: Device pixels 20..30 are covered, neighbours are not
    assert_eq!(canvas.pixel(20, 20), Some(RED));
    assert_eq!(canvas.pixel(29, 29), Some(RED));
    assert_eq!(canvas.pixel(19, 20), Some(Rgba::TRANSPARENT));
    assert_eq!(canvas.pixel(30, 29), Some(Rgba::TRANSPARENT));
    assert_eq!(canvas.painted_pixels(), 100);
}

/// WHAT: Clearing and out-of-range drawing are safe
/// WHY: Bars scrolled past the edge are clipped, not errors
#[test]
fn given_offscreen_rect_when_filling_then_clipped() {
    // Given: A small canvas
    let mut canvas = PixelCanvas::new(10.0, 10.0, 1.0);

    // When: Filling partly outside, then clearing
    canvas.fill_rect(-5.0, -5.0, 7.0, 7.0, RED);
    let painted = canvas.painted_pixels();
    canvas.clear();

    // Then: Only the visible 2x2 corner was painted
    assert_eq!(painted, 4);
    assert_eq!(canvas.painted_pixels(), 0);
    assert_eq!(canvas.pixel(10, 0), None);
}

/// WHAT: A shared canvas snapshot reflects drawing through any clone
/// WHY: The host reads back what the controller's renderer painted
#[test]
fn given_shared_canvas_when_drawing_through_clone_then_snapshot_sees_it() {
    // Given: A shared canvas and a clone
    let shared = SharedCanvas::new(20.0, 20.0, 1.0);
    let mut writer = shared.clone();

    // When: Drawing a line through the clone
    writer.stroke_line(&[(0.0, 10.0), (19.0, 10.0)], 2.0, RED);

    // Then: The snapshot holds the line
    let snapshot = shared.snapshot();
    assert_eq!(snapshot.pixel(5, 10), Some(RED));
    assert!(snapshot.painted_pixels() >= 20);
}

/// WHAT: Colours parse from hex with optional alpha
/// WHY: Configuration stores colours as hex strings
#[test]
fn given_hex_strings_when_parsing_then_rgba() {
    // Given/When/Then
    assert_eq!(Rgba::from_hex("#ff0000"), Some(RED));
    assert_eq!(Rgba::from_hex("00ff0080"), Some(Rgba([0, 255, 0, 128])));
    assert_eq!(Rgba::from_hex("#zzz"), None);
    assert_eq!(RED.to_hex(), "#ff0000ff");
}
