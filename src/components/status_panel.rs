use crate::model::MapOrigin;
use crate::viewer::ViewerStatus;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct StatusPanelProps {
    pub status: Option<ViewerStatus>,
    /// Set when the canvas could not be initialised.
    #[prop_or_default]
    pub error: Option<AttrValue>,
}

#[function_component]
pub fn StatusPanel(props: &StatusPanelProps) -> Html {
    let row_style = "display:flex; align-items:center; gap:8px;"; // label | value
    let label_style = "flex:1; font-weight:500; color:#8b949e;";
    let value_style =
        "min-width:90px; text-align:right; font-variant-numeric:tabular-nums; font-weight:600;";
    let row = |label: &'static str, value: String, color: &'static str| {
        html! {
            <div style={row_style}>
                <span style={label_style}>{ label }</span>
                <span style={format!("{} color:{};", value_style, color)}>{ value }</span>
            </div>
        }
    };

    let body = match (&props.error, &props.status) {
        (Some(err), _) => html! { <div style="color:#f85149; max-width:240px;">{ err.clone() }</div> },
        (None, None) => html! { <div style="color:#8b949e;">{"Starting…"}</div> },
        (None, Some(s)) => {
            let (source, source_color) = match s.origin {
                None => ("loading…", "#8b949e"),
                Some(MapOrigin::Remote) => ("remote", "#2ea043"),
                Some(MapOrigin::Fallback) => ("fallback", "#f0883e"),
            };
            let selected = s
                .selected
                .map(|p| format!("({}, {})", p.x, p.y))
                .unwrap_or_else(|| "none".into());
            html! {<>
                { row("Map", source.to_string(), source_color) }
                { row("Size", format!("{} × {}", s.size.width, s.size.height), "#c9d1d9") }
                { row("Tanks", s.tanks.to_string(), "#c9d1d9") }
                { row("Selected", selected, "#d4af37") }
                { row("Sprite", if s.texture_loaded { "loaded" } else { "none" }.to_string(), "#58a6ff") }
            </>}
        }
    };
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:10px 14px; min-width:200px; display:flex; flex-direction:column; gap:8px; font-size:14px;">
            { body }
        </div>
    }
}
