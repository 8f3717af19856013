pub mod animation;
pub mod controller;
pub mod easing;
pub mod settings;
pub mod transform;
pub mod tree_view;

pub use animation::FocusAnimation;
pub use controller::{
    ControllerConfig, DragState, ScaleExtent, TickStatus, ViewportController, ViewportState,
    wheel_zoom_factor,
};
pub use easing::Easing;
pub use settings::{CardSize, ViewSettings};
pub use transform::{ViewportSize, ViewportTransform};
pub use tree_view::{NodeCard, PointerEvent, RenderFrame, TreeView};
