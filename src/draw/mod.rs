pub mod canvas;
pub mod composite;
pub mod compositor;
pub mod history;
pub mod input;
pub mod layers;
pub mod model;
pub mod render;
pub mod save;
pub mod settings;
pub mod settings_store;

pub use canvas::AnnotationCanvas;
pub use compositor::{DrawingSession, StrokeCompositor};
pub use history::DrawHistory;
pub use layers::{BackgroundPlacement, LayerStore};
pub use model::{Color, Stroke, Tool};
