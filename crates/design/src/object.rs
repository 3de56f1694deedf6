//! Drawing objects placed on a design canvas.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::geometry::{Bounds, Point, segment_distance};

/// Stable identifier of an object within one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub id: ObjectId,
    pub bounds: Bounds,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub fill: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: ObjectId,
    pub center: Point,
    pub radius: f32,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub fill: Option<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: ObjectId,
    pub from: Point,
    pub to: Point,
    pub stroke: Rgba,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Textbox {
    pub id: ObjectId,
    pub origin: Point,
    pub text: String,
    pub font_size: f32,
    pub color: Rgba,
    pub background: Option<Rgba>,
}

impl Textbox {
    /// Approximate layout box; glyphs are never shaped here.
    pub fn bounds(&self) -> Bounds {
        let longest = self
            .text
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let lines = self.text.lines().count().max(1);
        let width = longest as f32 * self.font_size * 0.6;
        let height = lines as f32 * self.font_size * 1.2;
        Bounds::from_corners(self.origin, self.origin.offset(width, height))
    }
}

/// Freehand brush or eraser stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: ObjectId,
    pub points: Vec<Point>,
    pub color: Rgba,
    pub width: f32,
    /// Eraser strokes clear whatever was rendered beneath them.
    pub erase: bool,
}

/// Raster content: flood-fill results and flattened layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ObjectId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Image {
    fn alpha_at(&self, p: Point) -> Option<u8> {
        let px = (p.x.floor() as i64) - i64::from(self.x);
        let py = (p.y.floor() as i64) - i64::from(self.y);
        if px < 0 || py < 0 || px >= i64::from(self.width) || py >= i64::from(self.height) {
            return None;
        }
        let idx = (py as usize * self.width as usize + px as usize) * 4 + 3;
        self.pixels.get(idx).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawObject {
    Rectangle(Rectangle),
    Circle(Circle),
    Line(Line),
    Textbox(Textbox),
    Stroke(Stroke),
    Image(Image),
}

impl DrawObject {
    pub fn id(&self) -> ObjectId {
        match self {
            DrawObject::Rectangle(o) => o.id,
            DrawObject::Circle(o) => o.id,
            DrawObject::Line(o) => o.id,
            DrawObject::Textbox(o) => o.id,
            DrawObject::Stroke(o) => o.id,
            DrawObject::Image(o) => o.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DrawObject::Rectangle(_) => "rectangle",
            DrawObject::Circle(_) => "circle",
            DrawObject::Line(_) => "line",
            DrawObject::Textbox(_) => "textbox",
            DrawObject::Stroke(_) => "stroke",
            DrawObject::Image(_) => "image",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DrawObject::Textbox(_))
    }

    /// Visual extent, including half the stroke width.
    pub fn bounds(&self) -> Bounds {
        match self {
            DrawObject::Rectangle(o) => o.bounds.inflate(o.stroke_width / 2.0),
            DrawObject::Circle(o) => Bounds::from_corners(o.center, o.center)
                .inflate(o.radius + o.stroke_width / 2.0),
            DrawObject::Line(o) => Bounds::from_corners(o.from, o.to).inflate(o.stroke_width / 2.0),
            DrawObject::Textbox(o) => o.bounds(),
            DrawObject::Stroke(o) => Bounds::from_points(&o.points)
                .unwrap_or_else(|| Bounds::from_corners(Point::default(), Point::default()))
                .inflate(o.width / 2.0),
            DrawObject::Image(o) => Bounds {
                min_x: o.x as f32,
                min_y: o.y as f32,
                max_x: o.x as f32 + o.width as f32,
                max_y: o.y as f32 + o.height as f32,
            },
        }
    }

    /// Whether a click at `p` lands on this object. `slop` widens thin
    /// shapes so they stay clickable.
    pub fn hit_test(&self, p: Point, slop: f32) -> bool {
        match self {
            DrawObject::Rectangle(o) => o.bounds.inflate(o.stroke_width / 2.0 + slop).contains(p),
            DrawObject::Circle(o) => p.distance(o.center) <= o.radius + o.stroke_width / 2.0 + slop,
            DrawObject::Line(o) => segment_distance(p, o.from, o.to) <= o.stroke_width / 2.0 + slop,
            DrawObject::Textbox(o) => o.bounds().inflate(slop).contains(p),
            DrawObject::Stroke(o) => {
                if o.erase {
                    return false;
                }
                let reach = o.width / 2.0 + slop;
                match o.points.as_slice() {
                    [] => false,
                    [only] => p.distance(*only) <= reach,
                    pts => pts.windows(2).any(|w| segment_distance(p, w[0], w[1]) <= reach),
                }
            }
            DrawObject::Image(o) => o.alpha_at(p).is_some_and(|a| a > 0),
        }
    }

    /// Move the object by `(dx, dy)`; images snap to whole pixels.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            DrawObject::Rectangle(o) => {
                o.bounds = Bounds {
                    min_x: o.bounds.min_x + dx,
                    min_y: o.bounds.min_y + dy,
                    max_x: o.bounds.max_x + dx,
                    max_y: o.bounds.max_y + dy,
                };
            }
            DrawObject::Circle(o) => o.center = o.center.offset(dx, dy),
            DrawObject::Line(o) => {
                o.from = o.from.offset(dx, dy);
                o.to = o.to.offset(dx, dy);
            }
            DrawObject::Textbox(o) => o.origin = o.origin.offset(dx, dy),
            DrawObject::Stroke(o) => {
                for p in &mut o.points {
                    *p = p.offset(dx, dy);
                }
            }
            DrawObject::Image(o) => {
                o.x += dx.round() as i32;
                o.y += dy.round() as i32;
            }
        }
    }
}
