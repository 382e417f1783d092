pub mod boundary;
pub mod config;
pub mod driver;
pub mod error;
pub mod figure;
pub mod frame;
pub mod links;
pub mod math;
pub mod overflow;
pub mod particle;
pub mod registry;
pub mod render;
pub mod section;
pub mod slots;

pub use config::SceneConfig;
pub use driver::{FrameReport, SceneDriver};
pub use error::{Result, SceneError};
pub use render::{FigureStore, RenderBackend};
