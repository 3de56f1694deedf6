use thiserror::Error;

pub type DesignResult<T> = Result<T, DesignError>;

#[derive(Debug, Error, PartialEq)]
pub enum DesignError {
    #[error("invalid canvas dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid tool setting: {0}")]
    InvalidSetting(String),

    #[error("invalid gesture: {0}")]
    InvalidGesture(String),

    #[error("point ({x}, {y}) is outside the canvas")]
    OutOfBounds { x: f32, y: f32 },

    #[error("object id space exhausted")]
    IdsExhausted,

    #[error("no such object: {0}")]
    UnknownObject(u64),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("raster error: {0}")]
    Raster(String),

    #[error("invalid design document: {0}")]
    Document(String),
}
