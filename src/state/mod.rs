pub mod camera;
pub mod gesture;
pub mod selection;
pub mod touch;

pub use camera::{ViewState, ZoomBounds};
pub use gesture::{GestureMode, GestureTracker, Tap};
pub use selection::{
    HIGHLIGHT_MARKER, NullReporter, SelectionController, SelectionReporter, SelectionUpdate,
};
pub use touch::{PointerId, TouchState, TrackedPointer};
