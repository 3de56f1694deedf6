//! Rasterisation of drawing objects onto a `tiny_skia` pixmap.

use std::collections::VecDeque;

use tiny_skia::{self as sk, Transform};
use tracing::warn;

use crate::color::Rgba;
use crate::error::{DesignError, DesignResult};
use crate::geometry::Point;
use crate::object::{DrawObject, Image, Stroke};

pub(crate) fn blank(width: u32, height: u32) -> DesignResult<sk::Pixmap> {
    sk::Pixmap::new(width, height).ok_or(DesignError::InvalidDimensions { width, height })
}

/// Draw `objects` in order onto a fresh transparent pixmap.
pub(crate) fn rasterize<'a>(
    width: u32,
    height: u32,
    objects: impl IntoIterator<Item = &'a DrawObject>,
) -> DesignResult<sk::Pixmap> {
    let mut pixmap = blank(width, height)?;
    for object in objects {
        draw_object(&mut pixmap, object);
    }
    Ok(pixmap)
}

pub(crate) fn encode_png(pixmap: &sk::Pixmap) -> DesignResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| DesignError::Raster(e.to_string()))
}

fn solid(color: Rgba) -> sk::Paint<'static> {
    let mut paint = sk::Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> sk::Stroke {
    sk::Stroke {
        width,
        line_cap: sk::LineCap::Round,
        line_join: sk::LineJoin::Round,
        ..sk::Stroke::default()
    }
}

fn polyline(points: &[Point]) -> Option<sk::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = sk::PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

pub(crate) fn draw_object(pixmap: &mut sk::Pixmap, object: &DrawObject) {
    let id = Transform::identity();
    match object {
        DrawObject::Rectangle(r) => {
            let b = r.bounds;
            let Some(rect) = sk::Rect::from_ltrb(b.min_x, b.min_y, b.max_x, b.max_y) else {
                return;
            };
            let path = sk::PathBuilder::from_rect(rect);
            if let Some(fill) = r.fill {
                pixmap.fill_path(&path, &solid(fill), sk::FillRule::Winding, id, None);
            }
            pixmap.stroke_path(&path, &solid(r.stroke), &round_stroke(r.stroke_width), id, None);
        }
        DrawObject::Circle(c) => {
            let Some(path) = sk::PathBuilder::from_circle(c.center.x, c.center.y, c.radius) else {
                return;
            };
            if let Some(fill) = c.fill {
                pixmap.fill_path(&path, &solid(fill), sk::FillRule::Winding, id, None);
            }
            pixmap.stroke_path(&path, &solid(c.stroke), &round_stroke(c.stroke_width), id, None);
        }
        DrawObject::Line(l) => {
            if let Some(path) = polyline(&[l.from, l.to]) {
                pixmap.stroke_path(&path, &solid(l.stroke), &round_stroke(l.stroke_width), id, None);
            }
        }
        DrawObject::Textbox(t) => {
            // Glyphs are not rasterised; only the background box is.
            let Some(background) = t.background else {
                return;
            };
            let b = t.bounds();
            if let Some(rect) = sk::Rect::from_ltrb(b.min_x, b.min_y, b.max_x, b.max_y) {
                pixmap.fill_rect(rect, &solid(background), id, None);
            }
        }
        DrawObject::Stroke(s) => draw_stroke(pixmap, s),
        DrawObject::Image(img) => draw_image(pixmap, img),
    }
}

fn draw_stroke(pixmap: &mut sk::Pixmap, stroke: &Stroke) {
    let mut paint = solid(stroke.color);
    if stroke.erase {
        paint.blend_mode = sk::BlendMode::Clear;
    }

    let mut points = stroke.points.clone();
    points.dedup();
    match points.as_slice() {
        [] => {}
        [dot] => {
            if let Some(path) = sk::PathBuilder::from_circle(dot.x, dot.y, stroke.width / 2.0) {
                pixmap.fill_path(&path, &paint, sk::FillRule::Winding, Transform::identity(), None);
            }
        }
        pts => {
            if let Some(path) = polyline(pts) {
                pixmap.stroke_path(
                    &path,
                    &paint,
                    &round_stroke(stroke.width),
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}

fn draw_image(pixmap: &mut sk::Pixmap, image: &Image) {
    let Some(size) = sk::IntSize::from_wh(image.width, image.height) else {
        warn!(object = %image.id, "skipping image with empty size");
        return;
    };
    let Some(src) = sk::Pixmap::from_vec(image.pixels.clone(), size) else {
        warn!(object = %image.id, "skipping image with mismatched pixel buffer");
        return;
    };
    pixmap.draw_pixmap(
        image.x,
        image.y,
        src.as_ref(),
        &sk::PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

/// Pixels covered by a flood fill, cropped to their bounding box.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FillRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8; pixels outside the region are transparent.
    pub pixels: Vec<u8>,
    pub filled: usize,
}

/// 4-connected fill from `(seed_x, seed_y)` over pixels whose colour is
/// within `tolerance` of the seed colour.
pub(crate) fn flood_fill(
    pixmap: &sk::Pixmap,
    seed_x: u32,
    seed_y: u32,
    tolerance: u8,
    color: Rgba,
) -> Option<FillRegion> {
    let width = pixmap.width();
    let height = pixmap.height();
    if seed_x >= width || seed_y >= height {
        return None;
    }

    let pixels = pixmap.pixels();
    let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;
    let color_at = |i: usize| Rgba::from_skia(pixels[i].demultiply());
    let seed = color_at(index(seed_x, seed_y));

    let mut inside = vec![false; pixels.len()];
    let mut queue = VecDeque::from([(seed_x, seed_y)]);
    inside[index(seed_x, seed_y)] = true;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (seed_x, seed_y, seed_x, seed_y);
    let mut filled = 0usize;

    while let Some((x, y)) = queue.pop_front() {
        filled += 1;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);

        let neighbours = [
            (x.checked_sub(1), Some(y)),
            (x.checked_add(1).filter(|&nx| nx < width), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), y.checked_add(1).filter(|&ny| ny < height)),
        ];
        for (nx, ny) in neighbours {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let i = index(nx, ny);
            if !inside[i] && color_at(i).distance(seed) <= tolerance {
                inside[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    let region_w = max_x - min_x + 1;
    let region_h = max_y - min_y + 1;
    let fill = color.to_premultiplied();
    let mut out = vec![0u8; region_w as usize * region_h as usize * 4];
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if inside[index(x, y)] {
                let o = ((y - min_y) as usize * region_w as usize + (x - min_x) as usize) * 4;
                out[o..o + 4].copy_from_slice(&[fill.red(), fill.green(), fill.blue(), fill.alpha()]);
            }
        }
    }

    Some(FillRegion {
        x: min_x,
        y: min_y,
        width: region_w,
        height: region_h,
        pixels: out,
        filled,
    })
}
