use crate::detection::{Detection, DetectionResult};
use crate::font::LabelFont;
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const BOX_THICKNESS: i32 = 2;
const LABEL_MARGIN: i32 = 5;
const LABEL_PADDING_X: i32 = 5;
const LABEL_PADDING_Y: i32 = 2;
const MIN_LABEL_PX: f32 = 8.0;
const MAX_LABEL_PX: f32 = 256.0;

/// Draws every complete detection of `result` onto a copy of `image`.
pub fn annotate(image: &RgbImage, result: &DetectionResult, font: &LabelFont) -> RgbImage {
    let mut annotated = image.clone();
    for detection in result.detections() {
        draw_detection(&mut annotated, &detection, font);
    }
    annotated
}

fn draw_detection(canvas: &mut RgbImage, detection: &Detection, font: &LabelFont) {
    let corners = detection.corners();
    let (canvas_w, canvas_h) = canvas.dimensions();
    let x1 = to_pixel(corners.x1, canvas_w);
    let y1 = to_pixel(corners.y1, canvas_h);
    let x2 = to_pixel(corners.x2, canvas_w);
    let y2 = to_pixel(corners.y2, canvas_h);

    // Outline grows inward, matching a stroked rectangle of the given width.
    for inset in 0..BOX_THICKNESS {
        let width = x2 - x1 + 1 - 2 * inset;
        let height = y2 - y1 + 1 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x1 + inset, y1 + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }

    let px = label_px(detection.height);
    let text = detection.label_text();
    let (text_w, text_h) = font.text_size(px, &text);
    let text_w = text_w as i32;
    let text_h = text_h as i32;

    let background_top = y1 - text_h - LABEL_MARGIN;
    let background = Rect::at(x1, background_top).of_size(
        (text_w + 2 * LABEL_PADDING_X) as u32,
        (text_h + LABEL_MARGIN) as u32,
    );
    draw_filled_rect_mut(canvas, background, LABEL_BACKGROUND);

    font.draw_text(
        canvas,
        LABEL_TEXT,
        x1 + LABEL_PADDING_X,
        background_top + LABEL_PADDING_Y,
        px,
        &text,
    );
}

/// Rounds to a pixel coordinate, pinned just outside the canvas so that
/// offscreen edges stay offscreen without overflowing later arithmetic.
fn to_pixel(value: f64, limit: u32) -> i32 {
    let max = limit as f64 + BOX_THICKNESS as f64;
    value.round().clamp(-(BOX_THICKNESS as f64), max) as i32
}

/// Label text height is a tenth of the box height.
fn label_px(box_height: f64) -> f32 {
    ((box_height * 0.1).floor() as f32).clamp(MIN_LABEL_PX, MAX_LABEL_PX)
}
