pub mod app;
pub mod camera_controls;
pub mod legend;
pub mod legend_panel;
pub mod map_view;
pub mod status_panel;
