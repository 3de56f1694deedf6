//! Design canvas for t-shirt artwork.
//!
//! A [`DesignCanvas`] holds an ordered list of [`DrawObject`]s. Drawing is
//! driven by [`Gesture`]s interpreted through an immutable [`ToolState`];
//! every mutation is undoable. Rendering goes through `tiny-skia`.

pub mod canvas;
pub mod color;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod object;
mod raster;
pub mod tool;

pub use canvas::{DesignCanvas, DesignDocument, MAX_DIMENSION, MAX_FREEHAND_POINTS};
pub use color::Rgba;
pub use error::{DesignError, DesignResult};
pub use geometry::{Bounds, Point};
pub use gesture::Gesture;
pub use history::{DEFAULT_HISTORY_DEPTH, History};
pub use object::{DrawObject, ObjectId};
pub use tool::{Tool, ToolState};
