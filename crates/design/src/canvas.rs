use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::Rgba;
use crate::error::{DesignError, DesignResult};
use crate::geometry::{Bounds, Point, simplify_polyline};
use crate::gesture::Gesture;
use crate::history::{DEFAULT_HISTORY_DEPTH, History};
use crate::object::{Circle, DrawObject, Image, Line, ObjectId, Rectangle, Stroke, Textbox};
use crate::raster;
use crate::tool::{Tool, ToolState};

pub const MAX_DIMENSION: u32 = 4096;
pub const DEFAULT_TEXT: &str = "Text";
/// Longest freehand gesture accepted, in input points.
pub const MAX_FREEHAND_POINTS: usize = 10_000;

/// Extra reach, in pixels, when hit testing thin shapes.
const HIT_SLOP: f32 = 3.0;
/// Freehand input is simplified to within this distance.
const STROKE_EPSILON: f32 = 0.75;

/// Serializable form of a canvas: its size and objects, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub width: u32,
    pub height: u32,
    pub objects: Vec<DrawObject>,
}

impl DesignDocument {
    pub fn to_json(&self) -> DesignResult<String> {
        serde_json::to_string(self).map_err(|e| DesignError::Document(e.to_string()))
    }

    pub fn from_json(json: &str) -> DesignResult<Self> {
        serde_json::from_str(json).map_err(|e| DesignError::Document(e.to_string()))
    }
}

/// A design surface: ordered objects, a selection, and undo history.
///
/// All drawing goes through [`DesignCanvas::apply`], which interprets a
/// gesture according to the active tool in the given [`ToolState`].
#[derive(Debug, Clone)]
pub struct DesignCanvas {
    width: u32,
    height: u32,
    objects: Vec<DrawObject>,
    selected: Option<ObjectId>,
    next_id: u64,
    history: History<Vec<DrawObject>>,
}

fn check_dimensions(width: u32, height: u32) -> DesignResult<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(DesignError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl DesignCanvas {
    pub fn new(width: u32, height: u32) -> DesignResult<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            objects: Vec::new(),
            selected: None,
            next_id: 1,
            history: History::with_depth(DEFAULT_HISTORY_DEPTH),
        })
    }

    /// Replace the history with an empty one of the given depth.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history = History::with_depth(depth);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Objects in paint order, bottom first.
    pub fn objects(&self) -> &[DrawObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&DrawObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn selected(&self) -> Option<&DrawObject> {
        self.selected.and_then(|id| self.object(id))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Interpret `gesture` with the active tool and return the tool state
    /// to use for the next gesture.
    pub fn apply(&mut self, state: &ToolState, gesture: Gesture) -> DesignResult<ToolState> {
        if !gesture.is_finite() {
            return Err(DesignError::InvalidGesture(format!(
                "{} with non-finite coordinates",
                gesture.kind()
            )));
        }
        if let Gesture::Freehand { points } = &gesture {
            if points.len() > MAX_FREEHAND_POINTS {
                return Err(DesignError::InvalidGesture(format!(
                    "freehand with {} points, at most {MAX_FREEHAND_POINTS} allowed",
                    points.len()
                )));
            }
        }

        match (state.tool(), gesture) {
            (Tool::Select, Gesture::Click { at }) => {
                self.selected = self.topmost_at(at);
            }
            (Tool::Select, Gesture::Drag { from, to }) => self.drag_selection(from, to),
            (Tool::Brush | Tool::Eraser, gesture) => self.add_stroke(state, gesture)?,
            (Tool::Rectangle, Gesture::Drag { from, to }) => {
                let bounds = Bounds::from_corners(from, to);
                if bounds.width() > 0.0 && bounds.height() > 0.0 {
                    let id = self.allocate_id()?;
                    self.push(DrawObject::Rectangle(Rectangle {
                        id,
                        bounds,
                        stroke: state.brush_color(),
                        stroke_width: state.brush_width(),
                        fill: state.fill_color(),
                    }));
                }
            }
            (Tool::Circle, Gesture::Drag { from, to }) => {
                let radius = from.distance(to);
                if radius > 0.0 {
                    let id = self.allocate_id()?;
                    self.push(DrawObject::Circle(Circle {
                        id,
                        center: from,
                        radius,
                        stroke: state.brush_color(),
                        stroke_width: state.brush_width(),
                        fill: state.fill_color(),
                    }));
                }
            }
            (Tool::Line, Gesture::Drag { from, to }) => {
                if from != to {
                    let id = self.allocate_id()?;
                    self.push(DrawObject::Line(Line {
                        id,
                        from,
                        to,
                        stroke: state.brush_color(),
                        stroke_width: state.brush_width(),
                    }));
                }
            }
            (Tool::Text, Gesture::Click { at }) => {
                let id = self.allocate_id()?;
                self.push(DrawObject::Textbox(Textbox {
                    id,
                    origin: at,
                    text: DEFAULT_TEXT.to_string(),
                    font_size: state.font_size(),
                    color: state.brush_color(),
                    background: state.fill_color(),
                }));
                self.selected = Some(id);
                return Ok(state.with_tool(Tool::Select));
            }
            (Tool::FloodFill, Gesture::Click { at }) => self.flood_fill(state, at)?,
            (tool, gesture) => {
                debug!(%tool, gesture = gesture.kind(), "gesture has no effect for tool");
            }
        }

        Ok(state.clone())
    }

    pub fn undo(&mut self) -> DesignResult<()> {
        if !self.history.can_undo() {
            return Err(DesignError::NothingToUndo);
        }
        let current = std::mem::take(&mut self.objects);
        self.objects = self.history.undo(current).ok_or(DesignError::NothingToUndo)?;
        self.prune_selection();
        Ok(())
    }

    pub fn redo(&mut self) -> DesignResult<()> {
        if !self.history.can_redo() {
            return Err(DesignError::NothingToRedo);
        }
        let current = std::mem::take(&mut self.objects);
        self.objects = self.history.redo(current).ok_or(DesignError::NothingToRedo)?;
        self.prune_selection();
        Ok(())
    }

    pub fn remove(&mut self, id: ObjectId) -> DesignResult<DrawObject> {
        let index = self
            .objects
            .iter()
            .position(|o| o.id() == id)
            .ok_or(DesignError::UnknownObject(id.0))?;
        self.history.record(self.objects.clone());
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(self.objects.remove(index))
    }

    /// Remove the selected object, if any.
    pub fn remove_selected(&mut self) -> DesignResult<Option<DrawObject>> {
        match self.selected {
            Some(id) => self.remove(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn clear(&mut self) {
        if self.objects.is_empty() {
            return;
        }
        self.history.record(std::mem::take(&mut self.objects));
        self.selected = None;
    }

    pub fn set_text(&mut self, id: ObjectId, text: impl Into<String>) -> DesignResult<()> {
        let index = self
            .objects
            .iter()
            .position(|o| o.id() == id)
            .ok_or(DesignError::UnknownObject(id.0))?;
        if !self.objects[index].is_text() {
            return Err(DesignError::InvalidSetting(format!("object {id} is not a textbox")));
        }
        self.history.record(self.objects.clone());
        if let DrawObject::Textbox(t) = &mut self.objects[index] {
            t.text = text.into();
        }
        Ok(())
    }

    /// Merge every non-text object into a single full-canvas image.
    /// Textboxes stay editable above it. Returns the new image's id, or
    /// `None` when there was nothing to merge.
    pub fn flatten(&mut self) -> DesignResult<Option<ObjectId>> {
        let (text, shapes): (Vec<DrawObject>, Vec<DrawObject>) =
            self.objects.iter().cloned().partition(DrawObject::is_text);
        if shapes.is_empty() {
            return Ok(None);
        }

        let pixmap = raster::rasterize(self.width, self.height, &shapes)?;
        let id = self.allocate_id()?;
        let image = DrawObject::Image(Image {
            id,
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
            pixels: pixmap.take(),
        });

        self.history.record(std::mem::replace(
            &mut self.objects,
            std::iter::once(image).chain(text).collect(),
        ));
        self.prune_selection();
        info!(merged = shapes.len(), image = %id, "canvas flattened");
        Ok(Some(id))
    }

    /// PNG of the current canvas. Textboxes contribute their background only.
    pub fn render_png(&self) -> DesignResult<Vec<u8>> {
        let pixmap = raster::rasterize(self.width, self.height, &self.objects)?;
        raster::encode_png(&pixmap)
    }

    pub fn document(&self) -> DesignDocument {
        DesignDocument {
            width: self.width,
            height: self.height,
            objects: self.objects.clone(),
        }
    }

    /// Load a document into a fresh canvas with empty history.
    pub fn from_document(doc: DesignDocument) -> DesignResult<Self> {
        check_dimensions(doc.width, doc.height)?;

        let mut seen = HashSet::new();
        for object in &doc.objects {
            if !seen.insert(object.id()) {
                return Err(DesignError::Document(format!(
                    "duplicate object id {}",
                    object.id()
                )));
            }
            if let DrawObject::Image(img) = object {
                validate_image(img)?;
            }
        }

        let next_id = doc
            .objects
            .iter()
            .map(|o| o.id().0)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(DesignError::IdsExhausted)?;
        Ok(Self {
            width: doc.width,
            height: doc.height,
            objects: doc.objects,
            selected: None,
            next_id,
            history: History::with_depth(DEFAULT_HISTORY_DEPTH),
        })
    }

    fn allocate_id(&mut self) -> DesignResult<ObjectId> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(DesignError::IdsExhausted)?;
        Ok(ObjectId(id))
    }

    fn push(&mut self, object: DrawObject) {
        self.history.record(self.objects.clone());
        debug!(object = %object.id(), kind = object.kind(), "object added");
        self.objects.push(object);
    }

    fn topmost_at(&self, at: Point) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.hit_test(at, HIT_SLOP))
            .map(DrawObject::id)
    }

    fn drag_selection(&mut self, from: Point, to: Point) {
        let Some(id) = self.topmost_at(from) else {
            self.selected = None;
            return;
        };
        self.selected = Some(id);
        if from == to {
            return;
        }
        self.history.record(self.objects.clone());
        if let Some(object) = self.objects.iter_mut().find(|o| o.id() == id) {
            object.translate(to.x - from.x, to.y - from.y);
        }
    }

    fn add_stroke(&mut self, state: &ToolState, gesture: Gesture) -> DesignResult<()> {
        let points = match gesture {
            Gesture::Click { at } => vec![at],
            Gesture::Drag { from, to } => vec![from, to],
            Gesture::Freehand { points } => simplify_polyline(&points, STROKE_EPSILON),
        };
        if points.is_empty() {
            return Ok(());
        }

        let erase = state.tool() == Tool::Eraser;
        let (color, width) = if erase {
            (Rgba::BLACK, state.eraser_size())
        } else {
            (state.brush_color(), state.brush_width())
        };
        let id = self.allocate_id()?;
        self.push(DrawObject::Stroke(Stroke {
            id,
            points,
            color,
            width,
            erase,
        }));
        Ok(())
    }

    fn flood_fill(&mut self, state: &ToolState, at: Point) -> DesignResult<()> {
        if at.x < 0.0 || at.y < 0.0 || at.x >= self.width as f32 || at.y >= self.height as f32 {
            return Err(DesignError::OutOfBounds { x: at.x, y: at.y });
        }

        let pixmap = raster::rasterize(self.width, self.height, &self.objects)?;
        let Some(region) = raster::flood_fill(
            &pixmap,
            at.x as u32,
            at.y as u32,
            state.fill_tolerance(),
            state.flood_color(),
        ) else {
            return Ok(());
        };

        let id = self.allocate_id()?;
        debug!(object = %id, pixels = region.filled, "flood fill");
        self.push(DrawObject::Image(Image {
            id,
            x: region.x as i32,
            y: region.y as i32,
            width: region.width,
            height: region.height,
            pixels: region.pixels,
        }));
        Ok(())
    }

    fn prune_selection(&mut self) {
        if self.selected.is_some_and(|id| self.object(id).is_none()) {
            self.selected = None;
        }
    }
}

fn validate_image(img: &Image) -> DesignResult<()> {
    let expected = img.width as usize * img.height as usize * 4;
    if img.width == 0 || img.height == 0 || img.pixels.len() != expected {
        return Err(DesignError::Document(format!(
            "image {} has {} bytes, expected {expected}",
            img.id,
            img.pixels.len()
        )));
    }
    let premultiplied = img
        .pixels
        .chunks_exact(4)
        .all(|px| px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
    if !premultiplied {
        return Err(DesignError::Document(format!(
            "image {} is not premultiplied",
            img.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn canvas() -> DesignCanvas {
        DesignCanvas::new(100, 100).unwrap()
    }

    #[fixture]
    fn tools() -> ToolState {
        ToolState::default()
    }

    fn draw_rect(canvas: &mut DesignCanvas, tools: &ToolState, from: (f32, f32), to: (f32, f32)) {
        canvas
            .apply(&tools.with_tool(Tool::Rectangle), Gesture::drag(from, to))
            .unwrap();
    }

    #[rstest]
    #[case(0, 10)]
    #[case(10, 0)]
    #[case(MAX_DIMENSION + 1, 10)]
    fn rejects_bad_dimensions(#[case] w: u32, #[case] h: u32) {
        assert_eq!(
            DesignCanvas::new(w, h).unwrap_err(),
            DesignError::InvalidDimensions { width: w, height: h }
        );
    }

    #[rstest]
    fn shapes_take_their_style_from_the_tool_state(mut canvas: DesignCanvas, tools: ToolState) {
        let tools = tools
            .with_brush_color("#ff0000")
            .unwrap()
            .with_fill_color(Some("blue"))
            .unwrap();
        draw_rect(&mut canvas, &tools, (10.0, 10.0), (40.0, 30.0));

        let DrawObject::Rectangle(rect) = &canvas.objects()[0] else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.stroke, Rgba::new(255, 0, 0, 255));
        assert_eq!(rect.fill, Some(Rgba::new(0, 0, 255, 255)));
        assert_eq!(rect.bounds.width(), 30.0);
    }

    #[rstest]
    #[case(Tool::Rectangle)]
    #[case(Tool::Circle)]
    #[case(Tool::Line)]
    fn zero_size_shapes_are_ignored(mut canvas: DesignCanvas, tools: ToolState, #[case] tool: Tool) {
        canvas
            .apply(&tools.with_tool(tool), Gesture::drag((5.0, 5.0), (5.0, 5.0)))
            .unwrap();
        assert!(canvas.objects().is_empty());
        assert!(!canvas.can_undo());
    }

    #[rstest]
    fn placing_text_switches_back_to_select(mut canvas: DesignCanvas, tools: ToolState) {
        let next = canvas
            .apply(&tools.with_tool(Tool::Text), Gesture::click(20.0, 20.0))
            .unwrap();

        assert_eq!(next.tool(), Tool::Select);
        let selected = canvas.selected().unwrap();
        assert!(selected.is_text());

        let id = selected.id();
        canvas.set_text(id, "Hello").unwrap();
        let DrawObject::Textbox(t) = canvas.object(id).unwrap() else {
            panic!("expected a textbox");
        };
        assert_eq!(t.text, "Hello");
    }

    #[rstest]
    fn other_tools_keep_the_state(mut canvas: DesignCanvas, tools: ToolState) {
        let brush = tools.with_tool(Tool::Brush);
        let next = canvas
            .apply(&brush, Gesture::freehand([(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)]))
            .unwrap();
        assert_eq!(next, brush);

        let DrawObject::Stroke(stroke) = &canvas.objects()[0] else {
            panic!("expected a stroke");
        };
        // Collinear input collapses to its endpoints.
        assert_eq!(stroke.points.len(), 2);
        assert!(!stroke.erase);
    }

    #[rstest]
    fn eraser_strokes_use_eraser_size(mut canvas: DesignCanvas, tools: ToolState) {
        let eraser = tools.with_tool(Tool::Eraser).with_eraser_size(30.0).unwrap();
        canvas
            .apply(&eraser, Gesture::drag((0.0, 0.0), (50.0, 0.0)))
            .unwrap();
        let DrawObject::Stroke(stroke) = &canvas.objects()[0] else {
            panic!("expected a stroke");
        };
        assert!(stroke.erase);
        assert_eq!(stroke.width, 30.0);
    }

    #[rstest]
    fn mismatched_gesture_is_a_no_op(mut canvas: DesignCanvas, tools: ToolState) {
        canvas
            .apply(&tools.with_tool(Tool::Rectangle), Gesture::click(5.0, 5.0))
            .unwrap();
        assert!(canvas.objects().is_empty());
    }

    #[rstest]
    fn non_finite_gestures_are_rejected(mut canvas: DesignCanvas, tools: ToolState) {
        let err = canvas
            .apply(&tools, Gesture::click(f32::NAN, 1.0))
            .unwrap_err();
        assert!(matches!(err, DesignError::InvalidGesture(_)));
    }

    #[rstest]
    fn select_click_picks_the_topmost_object(mut canvas: DesignCanvas, tools: ToolState) {
        draw_rect(&mut canvas, &tools, (0.0, 0.0), (50.0, 50.0));
        draw_rect(&mut canvas, &tools, (20.0, 20.0), (60.0, 60.0));

        canvas.apply(&tools, Gesture::click(30.0, 30.0)).unwrap();
        assert_eq!(canvas.selected().map(DrawObject::id), Some(ObjectId(2)));

        canvas.apply(&tools, Gesture::click(90.0, 90.0)).unwrap();
        assert!(canvas.selected().is_none());
    }

    #[rstest]
    fn select_drag_moves_the_object_and_is_undoable(mut canvas: DesignCanvas, tools: ToolState) {
        draw_rect(&mut canvas, &tools, (10.0, 10.0), (20.0, 20.0));
        canvas
            .apply(&tools, Gesture::drag((15.0, 15.0), (45.0, 25.0)))
            .unwrap();

        let DrawObject::Rectangle(moved) = &canvas.objects()[0] else {
            panic!("expected a rectangle");
        };
        assert_eq!((moved.bounds.min_x, moved.bounds.min_y), (40.0, 20.0));

        canvas.undo().unwrap();
        let DrawObject::Rectangle(back) = &canvas.objects()[0] else {
            panic!("expected a rectangle");
        };
        assert_eq!((back.bounds.min_x, back.bounds.min_y), (10.0, 10.0));
    }

    #[rstest]
    fn undo_redo_and_new_mutations_clear_redo(mut canvas: DesignCanvas, tools: ToolState) {
        assert_eq!(canvas.undo().unwrap_err(), DesignError::NothingToUndo);

        draw_rect(&mut canvas, &tools, (0.0, 0.0), (10.0, 10.0));
        draw_rect(&mut canvas, &tools, (20.0, 20.0), (30.0, 30.0));
        canvas.undo().unwrap();
        assert_eq!(canvas.objects().len(), 1);
        canvas.redo().unwrap();
        assert_eq!(canvas.objects().len(), 2);

        canvas.undo().unwrap();
        draw_rect(&mut canvas, &tools, (40.0, 40.0), (50.0, 50.0));
        assert_eq!(canvas.redo().unwrap_err(), DesignError::NothingToRedo);
        // Ids are never reused after an undo.
        assert_eq!(canvas.objects()[1].id(), ObjectId(3));
    }

    #[rstest]
    fn history_depth_is_configurable(tools: ToolState) {
        let mut canvas = DesignCanvas::new(50, 50).unwrap().with_history_depth(2);
        for i in 0..5 {
            let o = i as f32 * 5.0;
            draw_rect(&mut canvas, &tools, (o, o), (o + 3.0, o + 3.0));
        }
        canvas.undo().unwrap();
        canvas.undo().unwrap();
        assert!(canvas.undo().is_err());
        assert_eq!(canvas.objects().len(), 3);
    }

    #[rstest]
    fn remove_selected_and_clear_are_undoable(mut canvas: DesignCanvas, tools: ToolState) {
        assert_eq!(canvas.remove_selected().unwrap(), None);

        draw_rect(&mut canvas, &tools, (0.0, 0.0), (10.0, 10.0));
        draw_rect(&mut canvas, &tools, (50.0, 50.0), (60.0, 60.0));
        canvas.apply(&tools, Gesture::click(5.0, 5.0)).unwrap();

        let removed = canvas.remove_selected().unwrap().unwrap();
        assert_eq!(removed.id(), ObjectId(1));
        assert!(canvas.selected().is_none());

        canvas.clear();
        assert!(canvas.objects().is_empty());
        canvas.undo().unwrap();
        assert_eq!(canvas.objects().len(), 1);
        canvas.undo().unwrap();
        assert_eq!(canvas.objects().len(), 2);
    }

    #[rstest]
    fn unknown_objects_are_reported(mut canvas: DesignCanvas) {
        assert_eq!(
            canvas.remove(ObjectId(9)).unwrap_err(),
            DesignError::UnknownObject(9)
        );
        assert_eq!(
            canvas.set_text(ObjectId(9), "x").unwrap_err(),
            DesignError::UnknownObject(9)
        );
    }

    #[rstest]
    fn flood_fill_adds_an_image(mut canvas: DesignCanvas, tools: ToolState) {
        let tools = tools.with_fill_color(Some("#00ff00")).unwrap();
        draw_rect(&mut canvas, &tools, (10.0, 10.0), (30.0, 30.0));

        canvas
            .apply(&tools.with_tool(Tool::FloodFill), Gesture::click(90.0, 90.0))
            .unwrap();
        let DrawObject::Image(img) = &canvas.objects()[1] else {
            panic!("expected an image");
        };
        assert_eq!((img.x, img.y, img.width, img.height), (0, 0, 100, 100));

        let img = canvas.objects()[1].clone();
        assert!(img.hit_test(Point::new(90.0, 90.0), 0.0));
        assert!(!img.hit_test(Point::new(20.0, 20.0), 0.0));
    }

    #[rstest]
    fn flood_fill_outside_the_canvas_is_an_error(mut canvas: DesignCanvas, tools: ToolState) {
        let err = canvas
            .apply(&tools.with_tool(Tool::FloodFill), Gesture::click(100.0, 5.0))
            .unwrap_err();
        assert_eq!(err, DesignError::OutOfBounds { x: 100.0, y: 5.0 });
    }

    #[rstest]
    fn flatten_merges_shapes_below_text(mut canvas: DesignCanvas, tools: ToolState) {
        assert_eq!(canvas.flatten().unwrap(), None);

        draw_rect(&mut canvas, &tools, (0.0, 0.0), (10.0, 10.0));
        canvas
            .apply(&tools.with_tool(Tool::Text), Gesture::click(50.0, 50.0))
            .unwrap();
        canvas
            .apply(&tools.with_tool(Tool::Line), Gesture::drag((0.0, 90.0), (90.0, 90.0)))
            .unwrap();

        let image_id = canvas.flatten().unwrap().unwrap();
        let kinds: Vec<_> = canvas.objects().iter().map(DrawObject::kind).collect();
        assert_eq!(kinds, ["image", "textbox"]);
        assert_eq!(canvas.objects()[0].id(), image_id);

        canvas.undo().unwrap();
        assert_eq!(canvas.objects().len(), 3);
    }

    #[rstest]
    fn renders_png(mut canvas: DesignCanvas, tools: ToolState) {
        draw_rect(&mut canvas, &tools, (10.0, 10.0), (30.0, 30.0));
        let png = canvas.render_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[rstest]
    fn documents_round_trip_through_json(mut canvas: DesignCanvas, tools: ToolState) {
        draw_rect(&mut canvas, &tools, (10.0, 10.0), (30.0, 30.0));
        canvas
            .apply(&tools.with_tool(Tool::Text), Gesture::click(50.0, 50.0))
            .unwrap();

        let json = canvas.document().to_json().unwrap();
        let mut restored = DesignCanvas::from_document(DesignDocument::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.objects(), canvas.objects());
        assert!(!restored.can_undo());

        draw_rect(&mut restored, &tools, (60.0, 60.0), (70.0, 70.0));
        assert_eq!(restored.objects()[2].id(), ObjectId(3));
    }

    #[test]
    fn documents_with_bad_images_are_rejected() {
        let doc = DesignDocument {
            width: 10,
            height: 10,
            objects: vec![DrawObject::Image(Image {
                id: ObjectId(1),
                x: 0,
                y: 0,
                width: 2,
                height: 2,
                pixels: vec![0; 3],
            })],
        };
        assert!(matches!(
            DesignCanvas::from_document(doc),
            Err(DesignError::Document(_))
        ));
        assert!(matches!(
            DesignDocument::from_json("{"),
            Err(DesignError::Document(_))
        ));
    }

    #[rstest]
    fn long_freehand_strokes_are_accepted_up_to_the_limit(mut canvas: DesignCanvas, tools: ToolState) {
        let brush = tools.with_tool(Tool::Brush);
        let zigzag = |n: usize| {
            Gesture::freehand((0..n).map(|i| Point::new((i % 100) as f32, (i % 2) as f32 * 10.0)))
        };

        canvas.apply(&brush, zigzag(MAX_FREEHAND_POINTS)).unwrap();
        assert_eq!(canvas.objects().len(), 1);

        let err = canvas
            .apply(&brush, zigzag(MAX_FREEHAND_POINTS + 1))
            .unwrap_err();
        assert!(matches!(err, DesignError::InvalidGesture(_)));
        assert_eq!(canvas.objects().len(), 1);
    }

    fn single_line_document(id: u64) -> DesignDocument {
        DesignDocument {
            width: 10,
            height: 10,
            objects: vec![DrawObject::Line(Line {
                id: ObjectId(id),
                from: Point::new(0.0, 0.0),
                to: Point::new(5.0, 5.0),
                stroke: Rgba::BLACK,
                stroke_width: 1.0,
            })],
        }
    }

    #[test]
    fn documents_at_the_end_of_the_id_space_are_rejected() {
        assert_eq!(
            DesignCanvas::from_document(single_line_document(u64::MAX)).unwrap_err(),
            DesignError::IdsExhausted
        );
    }

    #[rstest]
    fn id_exhaustion_fails_the_gesture_without_changes(tools: ToolState) {
        let mut canvas = DesignCanvas::from_document(single_line_document(u64::MAX - 1)).unwrap();
        let err = canvas
            .apply(&tools.with_tool(Tool::Rectangle), Gesture::drag((1.0, 1.0), (4.0, 4.0)))
            .unwrap_err();
        assert_eq!(err, DesignError::IdsExhausted);
        assert_eq!(canvas.objects().len(), 1);
        assert!(!canvas.can_undo());
    }
}
