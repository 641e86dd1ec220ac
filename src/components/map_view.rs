use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent, Window,
};
use yew::prelude::*;

use super::{
    camera_controls::CameraControls, legend_panel::LegendPanel, status_panel::StatusPanel,
};
use crate::config::ViewerConfig;
use crate::host::BrowserHost;
use crate::input::{
    InputEvent, InputQueue, KeyEvent, MOUSE_POINTER_ID, PointerEvent, PointerPhase,
    wheel_zoom_factor,
};
use crate::loader::{HttpReporter, load_into};
use crate::render::webgl::WebGlBackend;
use crate::state::{NullReporter, SelectionReporter};
use crate::transform::Viewport;
use crate::viewer::{Viewer, ViewerStatus};

/// Zoom factor applied by the +/- buttons.
const ZOOM_STEP: f32 = 1.25;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

/// DOM listeners and the animation-frame loop of one mounted canvas. Dropping it detaches
/// everything.
#[derive(Default)]
struct Runtime {
    window: Option<Window>,
    listeners: Vec<Listener>,
    raf_id: Rc<RefCell<Option<i32>>>,
    frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl Runtime {
    fn listen<E: JsCast + 'static>(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        mut handler: impl FnMut(E) + 'static,
    ) {
        let callback = Closure::wrap(Box::new(move |e: web_sys::Event| {
            handler(e.unchecked_into::<E>())
        }) as Box<dyn FnMut(web_sys::Event)>);
        match target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.push(Listener {
                target: target.clone(),
                kind,
                callback,
            }),
            Err(e) => warn!(kind, error = ?e, "could not attach listener"),
        }
    }

    fn start_loop(&mut self, window: &Window, mut tick: impl FnMut() + 'static) {
        let raf_id = self.raf_id.clone();
        let frame = self.frame.clone();
        let window_loop = window.clone();
        *self.frame.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            tick();
            if let Some(cb) = frame.borrow().as_ref() {
                if let Ok(id) = window_loop.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    *raf_id.borrow_mut() = Some(id);
                }
            }
        }) as Box<dyn FnMut()>));
        if let Some(cb) = self.frame.borrow().as_ref() {
            if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                *self.raf_id.borrow_mut() = Some(id);
            }
        }
        self.window = Some(window.clone());
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        for l in self.listeners.drain(..) {
            let _ = l
                .target
                .remove_event_listener_with_callback(l.kind, l.callback.as_ref().unchecked_ref());
        }
        let pending = self.raf_id.borrow_mut().take();
        if let (Some(window), Some(id)) = (&self.window, pending) {
            let _ = window.cancel_animation_frame(id);
        }
        // The loop closure holds a handle to its own cell.
        self.frame.borrow_mut().take();
    }
}

/// Matches the drawing buffer to the element's CSS size in device pixels.
fn fit_canvas(canvas: &HtmlCanvasElement, window: &Window) {
    let dpr = window.device_pixel_ratio();
    let width = (canvas.client_width() as f64 * dpr).round() as u32;
    let height = (canvas.client_height() as f64 * dpr).round() as u32;
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }
}

/// Client coordinates to drawing-buffer pixels.
fn canvas_position(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    let sx = canvas.width() as f64 / rect.width().max(1.0);
    let sy = canvas.height() as f64 / rect.height().max(1.0);
    (
        ((client_x as f64 - rect.left()) * sx) as f32,
        ((client_y as f64 - rect.top()) * sy) as f32,
    )
}

/// Pointers still down after the `index`-th of `changed` touches in one DOM event is applied.
/// `still_down` is the DOM's count once the whole event has been applied.
fn pointer_count_after(phase: PointerPhase, still_down: u32, changed: u32, index: u32) -> u32 {
    match phase {
        PointerPhase::Down => still_down.saturating_sub(changed) + index + 1,
        PointerPhase::Up | PointerPhase::Cancel => still_down + (changed - 1 - index),
        PointerPhase::Move => still_down,
    }
}

fn push_touches(queue: &InputQueue, canvas: &HtmlCanvasElement, e: &TouchEvent, phase: PointerPhase) {
    let changed = e.changed_touches();
    let n = changed.length();
    let still_down = e.touches().length();
    for i in 0..n {
        let Some(touch) = changed.item(i) else {
            continue;
        };
        let (x, y) = canvas_position(canvas, touch.client_x(), touch.client_y());
        queue.push(InputEvent::Pointer(PointerEvent::new(
            phase,
            touch.identifier(),
            x,
            y,
            pointer_count_after(phase, still_down, n, i),
        )));
    }
}

fn mount(
    canvas_ref: &NodeRef,
    config: &ViewerConfig,
    queue: InputQueue,
    status: UseStateHandle<Option<ViewerStatus>>,
) -> Result<Runtime, String> {
    let window = web_sys::window().ok_or("browser window not available")?;
    let canvas = canvas_ref
        .cast::<HtmlCanvasElement>()
        .ok_or("canvas not mounted")?;
    fit_canvas(&canvas, &window);
    let mut backend = WebGlBackend::from_canvas(&canvas).map_err(|e| e.to_string())?;

    let reporter: Rc<dyn SelectionReporter> = if config.report_url.is_empty() {
        Rc::new(NullReporter)
    } else {
        Rc::new(HttpReporter::new(
            Rc::new(BrowserHost),
            config.report_url.clone(),
        ))
    };
    let mut viewer = Viewer::new(config, reporter);
    {
        let inbox = viewer.inbox();
        let map_url = config.map_url.clone();
        let sprite_url = config.sprite_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            load_into(&BrowserHost, &map_url, &sprite_url, &inbox).await;
        });
    }

    let mut rt = Runtime::default();
    let canvas_target: &EventTarget = canvas.as_ref();
    let window_target: &EventTarget = window.as_ref();

    // Touch
    for (kind, phase) in [
        ("touchstart", PointerPhase::Down),
        ("touchmove", PointerPhase::Move),
        ("touchend", PointerPhase::Up),
        ("touchcancel", PointerPhase::Cancel),
    ] {
        let queue = queue.clone();
        let canvas_tc = canvas.clone();
        rt.listen(canvas_target, kind, move |e: TouchEvent| {
            e.prevent_default();
            push_touches(&queue, &canvas_tc, &e, phase);
        });
    }

    // Mouse drives the same gesture path under its own pointer id.
    let mouse_down = Rc::new(Cell::new(false));
    {
        let queue = queue.clone();
        let canvas_mc = canvas.clone();
        let mouse_down = mouse_down.clone();
        rt.listen(canvas_target, "mousedown", move |e: MouseEvent| {
            if e.button() != 0 {
                return;
            }
            mouse_down.set(true);
            let (x, y) = canvas_position(&canvas_mc, e.client_x(), e.client_y());
            queue.push(InputEvent::Pointer(PointerEvent::new(
                PointerPhase::Down,
                MOUSE_POINTER_ID,
                x,
                y,
                1,
            )));
        });
    }
    {
        let queue = queue.clone();
        let canvas_mc = canvas.clone();
        let mouse_down = mouse_down.clone();
        rt.listen(window_target, "mousemove", move |e: MouseEvent| {
            if !mouse_down.get() {
                return;
            }
            let (x, y) = canvas_position(&canvas_mc, e.client_x(), e.client_y());
            queue.push(InputEvent::Pointer(PointerEvent::new(
                PointerPhase::Move,
                MOUSE_POINTER_ID,
                x,
                y,
                1,
            )));
        });
    }
    {
        let queue = queue.clone();
        let canvas_mc = canvas.clone();
        rt.listen(window_target, "mouseup", move |e: MouseEvent| {
            if e.button() != 0 || !mouse_down.replace(false) {
                return;
            }
            let (x, y) = canvas_position(&canvas_mc, e.client_x(), e.client_y());
            queue.push(InputEvent::Pointer(PointerEvent::new(
                PointerPhase::Up,
                MOUSE_POINTER_ID,
                x,
                y,
                0,
            )));
        });
    }
    rt.listen(canvas_target, "contextmenu", |e: web_sys::Event| {
        e.prevent_default();
    });
    {
        let queue = queue.clone();
        rt.listen(canvas_target, "wheel", move |e: WheelEvent| {
            e.prevent_default();
            queue.push(InputEvent::Zoom(wheel_zoom_factor(e.delta_y())));
        });
    }

    // Keys
    for (kind, pressed) in [("keydown", true), ("keyup", false)] {
        let queue = queue.clone();
        rt.listen(window_target, kind, move |e: KeyboardEvent| {
            queue.push(InputEvent::Key(KeyEvent {
                key: e.key(),
                pressed,
            }));
        });
    }

    {
        let canvas_rc = canvas.clone();
        let window_rc = window.clone();
        rt.listen(window_target, "resize", move |_e: web_sys::Event| {
            fit_canvas(&canvas_rc, &window_rc);
        });
    }

    // RAF loop
    let mut last_status: Option<ViewerStatus> = None;
    rt.start_loop(&window, move || {
        let viewport = Viewport::new(canvas.width() as f32, canvas.height() as f32);
        viewer.frame(&mut backend, viewport, queue.drain());
        let current = viewer.status();
        if last_status.as_ref() != Some(&current) {
            last_status = Some(current.clone());
            status.set(Some(current));
        }
    });
    info!("map view mounted");
    Ok(rt)
}

#[derive(Properties, PartialEq, Clone)]
pub struct MapViewProps {
    pub config: ViewerConfig,
}

#[function_component(MapView)]
pub fn map_view(props: &MapViewProps) -> Html {
    let canvas_ref = use_node_ref();
    let queue = use_state(InputQueue::default);
    let status = use_state(|| None::<ViewerStatus>);
    let mount_error = use_state(|| None::<AttrValue>);

    {
        let canvas_ref = canvas_ref.clone();
        let queue = (*queue).clone();
        let status = status.clone();
        let mount_error = mount_error.clone();
        let config = props.config.clone();
        use_effect_with((), move |_| {
            let runtime = match mount(&canvas_ref, &config, queue, status) {
                Ok(rt) => Some(rt),
                Err(msg) => {
                    error!(error = %msg, "map view unavailable");
                    mount_error.set(Some(msg.into()));
                    None
                }
            };
            move || drop(runtime)
        });
    }

    let zoom_in = {
        let queue = (*queue).clone();
        Callback::from(move |_| queue.push(InputEvent::Zoom(ZOOM_STEP)))
    };
    let zoom_out = {
        let queue = (*queue).clone();
        Callback::from(move |_| queue.push(InputEvent::Zoom(1.0 / ZOOM_STEP)))
    };
    let reset = {
        let queue = (*queue).clone();
        Callback::from(move |_| queue.push(InputEvent::ResetView))
    };

    let snapshot = (*status).clone();
    let present = snapshot
        .as_ref()
        .map(|s| s.present.clone())
        .unwrap_or_default();
    let has_selection = snapshot.as_ref().is_some_and(|s| s.selected.is_some());
    let zoom = snapshot
        .as_ref()
        .map_or(props.config.default_zoom, |s| s.zoom);

    html! {
        <>
            <canvas ref={canvas_ref} style="display:block; width:100%; height:100%; touch-action:none;" />
            <StatusPanel status={snapshot} error={(*mount_error).clone()} />
            <LegendPanel {present} {has_selection} />
            <CameraControls on_zoom_in={zoom_in} on_zoom_out={zoom_out} on_reset={reset} {zoom} />
        </>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_counts_track_each_changed_pointer() {
        // two fingers land together: counts step 1, 2
        assert_eq!(pointer_count_after(PointerPhase::Down, 2, 2, 0), 1);
        assert_eq!(pointer_count_after(PointerPhase::Down, 2, 2, 1), 2);
        // both lift together: 1 left after the first, 0 after the second
        assert_eq!(pointer_count_after(PointerPhase::Up, 0, 2, 0), 1);
        assert_eq!(pointer_count_after(PointerPhase::Up, 0, 2, 1), 0);
        assert_eq!(pointer_count_after(PointerPhase::Move, 2, 1, 0), 2);
    }
}
