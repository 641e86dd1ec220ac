use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct LegendRowProps {
    pub color: AttrValue,
    pub label: &'static str,
    /// Draw the swatch as an outline instead of a filled square.
    #[prop_or(false)]
    pub outline: bool,
}

#[function_component(LegendRow)]
pub fn legend_row(props: &LegendRowProps) -> Html {
    let swatch = if props.outline {
        format!("display:inline-block; width:10px; height:10px; border:2px solid {}; border-radius:2px;", props.color)
    } else {
        format!("display:inline-block; width:12px; height:12px; background:{}; border:1px solid #30363d; border-radius:2px;", props.color)
    };
    html! { <div style="display:flex; align-items:center; gap:8px; margin:3px 0;"> <span style={swatch}></span> <span>{ props.label }</span> </div> }
}
