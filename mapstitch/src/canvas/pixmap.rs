//! tiny-skia backed canvas
//!
//! Rasterizes onto a [`tiny_skia::Pixmap`]: tiles are decoded with the
//! `image` crate (tile servers mix PNG and JPEG), overlay lines are
//! stroked anti-aliased paths, and the finished canvas encodes to PNG.

use tiny_skia::{
    FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke, Transform,
};

use super::{Canvas, CanvasError, Color, MarkerIcon};

/// Pin geometry: circle radius and stem length, pixels.
const PIN_RADIUS: f32 = 6.0;
const PIN_STEM: f32 = 10.0;

/// Production canvas rasterizing into an RGBA pixmap.
pub struct PixmapCanvas {
    pixmap: Pixmap,
}

impl PixmapCanvas {
    /// Allocates a canvas filled with an opaque dark background, so tiles
    /// that fail to arrive read as blank rather than transparent.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(CanvasError::InvalidSize(width, height))?;
        pixmap.fill(tiny_skia::Color::from_rgba8(40, 40, 40, 255));
        Ok(Self { pixmap })
    }

    /// Encodes the canvas as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.pixmap
            .encode_png()
            .map_err(|e| CanvasError::Encode(e.to_string()))
    }

    /// Raw premultiplied RGBA pixels, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255));
        paint.anti_alias = true;
        paint
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.pixmap.fill_path(
                &path,
                &Self::paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

impl Canvas for PixmapCanvas {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn paste_tile(&mut self, data: &[u8], x: i64, y: i64) -> Result<(), CanvasError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| CanvasError::Decode(e.to_string()))?
            .to_rgba8();
        let tile = rgba_to_pixmap(decoded)?;
        self.pixmap.draw_pixmap(
            clamp_i32(x),
            clamp_i32(y),
            tile.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    fn draw_polyline(&mut self, points: &[(i64, i64)], color: Color, width: f32) {
        if points.len() < 2 {
            return;
        }
        let mut builder = PathBuilder::new();
        builder.move_to(points[0].0 as f32, points[0].1 as f32);
        for &(x, y) in &points[1..] {
            builder.line_to(x as f32, y as f32);
        }
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: tiny_skia::LineCap::Round,
            line_join: tiny_skia::LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &Self::paint(color),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn draw_marker(&mut self, center: (i64, i64), radius: f32, color: Color) {
        self.fill_circle(center.0 as f32, center.1 as f32, radius, color);
    }

    fn draw_icon(&mut self, icon: MarkerIcon, anchor: (i64, i64)) {
        let color = match icon {
            MarkerIcon::Open => Color::new(214, 39, 39),
            MarkerIcon::Resolved => Color::new(46, 139, 46),
        };
        let (ax, ay) = (anchor.0 as f32, anchor.1 as f32);
        // Stem down to the anchor, head circle above it, white dot on top.
        self.draw_polyline(
            &[anchor, (anchor.0, anchor.1 - PIN_STEM as i64)],
            color,
            3.0,
        );
        let head_y = ay - PIN_STEM - PIN_RADIUS * 0.5;
        self.fill_circle(ax, head_y, PIN_RADIUS, color);
        self.fill_circle(ax, head_y, PIN_RADIUS * 0.35, Color::new(255, 255, 255));
    }
}

/// Converts straight-alpha RGBA into a premultiplied pixmap.
fn rgba_to_pixmap(rgba: image::RgbaImage) -> Result<Pixmap, CanvasError> {
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize(width, height))?;
    for (src, dst) in rgba.pixels().zip(pixmap.pixels_mut()) {
        let [r, g, b, a] = src.0;
        *dst = PremultipliedColorU8::from_rgba(
            premultiply(r, a),
            premultiply(g, a),
            premultiply(b, a),
            a,
        )
        .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
    Ok(pixmap)
}

#[inline]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha)) / 255) as u8
}

#[inline]
fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 2x2 solid-color PNG for paste tests.
    fn tiny_png(color: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(2, 2);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgba(color);
        }
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encoding to memory cannot fail");
        bytes
    }

    fn pixel(canvas: &PixmapCanvas, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * canvas.width() + x) * 4) as usize;
        canvas.data()[idx..idx + 4].try_into().unwrap()
    }

    #[test]
    fn test_new_canvas_is_opaque() {
        let canvas = PixmapCanvas::new(8, 8).unwrap();
        assert_eq!(pixel(&canvas, 0, 0), [40, 40, 40, 255]);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            PixmapCanvas::new(0, 10),
            Err(CanvasError::InvalidSize(0, 10))
        ));
    }

    #[test]
    fn test_paste_tile_lands_at_offset() {
        let mut canvas = PixmapCanvas::new(8, 8).unwrap();
        canvas
            .paste_tile(&tiny_png([255, 0, 0, 255]), 3, 4)
            .unwrap();
        assert_eq!(pixel(&canvas, 3, 4), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 4, 5), [255, 0, 0, 255]);
        // Untouched elsewhere.
        assert_eq!(pixel(&canvas, 0, 0), [40, 40, 40, 255]);
    }

    #[test]
    fn test_paste_clips_negative_offsets() {
        let mut canvas = PixmapCanvas::new(8, 8).unwrap();
        // Only the bottom-right pixel of the 2x2 tile is on canvas.
        canvas
            .paste_tile(&tiny_png([0, 255, 0, 255]), -1, -1)
            .unwrap();
        assert_eq!(pixel(&canvas, 0, 0), [0, 255, 0, 255]);
        assert_eq!(pixel(&canvas, 1, 1), [40, 40, 40, 255]);
    }

    #[test]
    fn test_paste_rejects_garbage_bytes() {
        let mut canvas = PixmapCanvas::new(8, 8).unwrap();
        assert!(matches!(
            canvas.paste_tile(b"not an image", 0, 0),
            Err(CanvasError::Decode(_))
        ));
    }

    #[test]
    fn test_polyline_touches_pixels() {
        let mut canvas = PixmapCanvas::new(16, 16).unwrap();
        canvas.draw_polyline(&[(2, 8), (14, 8)], Color::new(0, 0, 255), 2.0);
        let p = pixel(&canvas, 8, 8);
        assert!(p[2] > 128, "expected blue stroke, got {:?}", p);
    }

    #[test]
    fn test_single_point_polyline_is_noop() {
        let mut canvas = PixmapCanvas::new(8, 8).unwrap();
        canvas.draw_polyline(&[(4, 4)], Color::new(255, 255, 255), 2.0);
        assert_eq!(pixel(&canvas, 4, 4), [40, 40, 40, 255]);
    }

    #[test]
    fn test_marker_fills_center() {
        let mut canvas = PixmapCanvas::new(16, 16).unwrap();
        canvas.draw_marker((8, 8), 4.0, Color::new(255, 0, 0));
        let p = pixel(&canvas, 8, 8);
        assert!(p[0] > 200, "expected red fill, got {:?}", p);
    }

    #[test]
    fn test_png_roundtrip() {
        let canvas = PixmapCanvas::new(8, 8).unwrap();
        let png = canvas.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }
}
