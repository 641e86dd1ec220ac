use super::map_view::MapView;
use crate::config::ViewerConfig;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct AppProps {
    pub config: ViewerConfig,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    html! {
        <div style="position:relative; width:100vw; height:100vh; overflow:hidden; background:#000; color:#c9d1d9; font-family:system-ui, sans-serif;">
            <MapView config={props.config.clone()} />
        </div>
    }
}
