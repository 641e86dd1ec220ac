use tank_grid_viewer::components::app::{App, AppProps};
use tank_grid_viewer::config::ViewerConfig;
use tank_grid_viewer::logging;
use tracing::{info, warn};

fn main() {
    let (config, issues) = ViewerConfig::load();
    logging::init_logging(&config.log_filter);
    for issue in issues {
        warn!(error = %issue, "configuration problem, defaults used");
    }
    info!(map = %config.map_url, sprite = %config.sprite_url, "starting tank grid viewer");
    yew::Renderer::<App>::with_props(AppProps { config }).render();
}
