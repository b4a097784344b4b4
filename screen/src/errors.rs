use thiserror::Error;

use crate::GameState;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Unable to acquire a device context for the screen")]
    DeviceContext,

    #[error("Unable to read the pixel at ({x}, {y})")]
    SampleFailed { x: i32, y: i32 },

    #[error("The detector rule for {0} has no sample coordinates")]
    EmptyRule(GameState),

    #[error("Unknown resolution preset: {0}")]
    UnknownResolution(String),

    #[error("Screen sampling is only supported on Windows")]
    Unsupported,
}
