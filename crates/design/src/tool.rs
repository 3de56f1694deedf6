use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::{DesignError, DesignResult};

pub const MAX_BRUSH_WIDTH: f32 = 200.0;
pub const MAX_ERASER_SIZE: f32 = 400.0;
pub const MAX_FONT_SIZE: f32 = 512.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Brush,
    Eraser,
    Rectangle,
    Circle,
    Line,
    Text,
    FloodFill,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Brush => "brush",
            Tool::Eraser => "eraser",
            Tool::Rectangle => "rectangle",
            Tool::Circle => "circle",
            Tool::Line => "line",
            Tool::Text => "text",
            Tool::FloodFill => "flood_fill",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active tool and its settings.
///
/// Values are immutable: every `with_*` method validates its input and
/// returns a new state, leaving `self` untouched. The canvas receives the
/// state with each gesture and hands back the state to use next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    tool: Tool,
    brush_color: Rgba,
    brush_width: f32,
    eraser_size: f32,
    fill_color: Option<Rgba>,
    fill_tolerance: u8,
    font_size: f32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            brush_color: Rgba::BLACK,
            brush_width: 4.0,
            eraser_size: 20.0,
            fill_color: None,
            fill_tolerance: 32,
            font_size: 24.0,
        }
    }
}

fn positive(what: &str, value: f32, max: f32) -> DesignResult<f32> {
    if value.is_finite() && value > 0.0 && value <= max {
        Ok(value)
    } else {
        Err(DesignError::InvalidSetting(format!(
            "{what} must be in (0, {max}], got {value}"
        )))
    }
}

impl ToolState {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn brush_color(&self) -> Rgba {
        self.brush_color
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn eraser_size(&self) -> f32 {
        self.eraser_size
    }

    /// Fill for closed shapes, and the flood-fill colour. Flood fill falls
    /// back to the brush colour when unset.
    pub fn fill_color(&self) -> Option<Rgba> {
        self.fill_color
    }

    pub fn fill_tolerance(&self) -> u8 {
        self.fill_tolerance
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn with_tool(&self, tool: Tool) -> Self {
        Self {
            tool,
            ..self.clone()
        }
    }

    pub fn with_brush_color(&self, color: &str) -> DesignResult<Self> {
        Ok(Self {
            brush_color: Rgba::parse(color)?,
            ..self.clone()
        })
    }

    pub fn with_brush_width(&self, width: f32) -> DesignResult<Self> {
        Ok(Self {
            brush_width: positive("brush width", width, MAX_BRUSH_WIDTH)?,
            ..self.clone()
        })
    }

    pub fn with_eraser_size(&self, size: f32) -> DesignResult<Self> {
        Ok(Self {
            eraser_size: positive("eraser size", size, MAX_ERASER_SIZE)?,
            ..self.clone()
        })
    }

    /// `None` clears the fill.
    pub fn with_fill_color(&self, color: Option<&str>) -> DesignResult<Self> {
        Ok(Self {
            fill_color: color.map(Rgba::parse).transpose()?,
            ..self.clone()
        })
    }

    pub fn with_fill_tolerance(&self, tolerance: u8) -> Self {
        Self {
            fill_tolerance: tolerance,
            ..self.clone()
        }
    }

    pub fn with_font_size(&self, size: f32) -> DesignResult<Self> {
        Ok(Self {
            font_size: positive("font size", size, MAX_FONT_SIZE)?,
            ..self.clone()
        })
    }

    pub(crate) fn flood_color(&self) -> Rgba {
        self.fill_color.unwrap_or(self.brush_color)
    }
}
