use super::legend::LegendRow;
use crate::model::GridCell;
use crate::scene::{self, Rgb};
use yew::prelude::*;

const TANK_SWATCH: &str = "#c9d1d9";

fn css(rgb: Rgb) -> AttrValue {
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    AttrValue::from(format!("#{r:02x}{g:02x}{b:02x}"))
}

fn swatch(cell: GridCell) -> (AttrValue, bool) {
    match cell {
        GridCell::Tank => (AttrValue::from(TANK_SWATCH), false),
        GridCell::Object => (css(scene::OBJECT_COLOR), false),
        other => (css(scene::outline_color(other).unwrap_or(scene::OUTLINE_COLOR)), true),
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct LegendPanelProps {
    /// Kinds present in the current grid.
    pub present: Vec<GridCell>,
    #[prop_or(false)]
    pub has_selection: bool,
}

#[function_component]
pub fn LegendPanel(props: &LegendPanelProps) -> Html {
    html! {<div style="position:absolute; right:12px; bottom:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px; min-width:140px;">
        <div style="font-weight:600; margin-bottom:4px;">{"Legend"}</div>
        { for props.present.iter().map(|&cell| {
            let (color, outline) = swatch(cell);
            html!{ <LegendRow {color} label={cell.label()} {outline}/> }
        }) }
        { if props.has_selection { html!{ <LegendRow color={css(scene::HIGHLIGHT_COLOR)} label="Selected" outline={true}/> } } else { html!{} } }
    </div>}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_hex_from_unit_rgb() {
        assert_eq!(css([1.0, 0.0, 0.5]).as_str(), "#ff0080");
        assert_eq!(css([2.0, -1.0, 0.0]).as_str(), "#ff0000");
    }

    #[test]
    fn outlined_kinds_use_their_tint() {
        assert_eq!(swatch(GridCell::Team2), (css(scene::TEAM2_COLOR), true));
        assert_eq!(swatch(GridCell::Unknown), (css(scene::OUTLINE_COLOR), true));
        assert!(!swatch(GridCell::Object).1);
    }
}
