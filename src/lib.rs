//! Interactive tile-map viewer: a grid of tanks, objects and team markers drawn with WebGL2,
//! with pan, pinch-zoom and tap-to-select.

pub mod components;
pub mod config;
pub mod host;
pub mod input;
pub mod loader;
pub mod logging;
pub mod map_data;
pub mod model;
pub mod render;
pub mod scene;
pub mod state;
pub mod transform;
pub mod viewer;
