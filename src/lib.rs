// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use tracing::{error, info};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

#[cfg(target_arch = "wasm32")]
use config::AppConfig;
#[cfg(target_arch = "wasm32")]
use controller::input::{wasm as web_input, InputEvent};
#[cfg(target_arch = "wasm32")]
use controller::{FrameDriver, InputState};
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, WgpuRenderer};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
    let search = window.location().search().unwrap_or_default();
    let mut config = AppConfig::from_query(&search);
    logging::init(config.debug);

    if let Some((width, height)) = window_size(&window) {
        config.width = width;
        config.height = height;
    }
    let document = window.document().ok_or_else(|| js_error("no document on window"))?;
    let canvas = init_canvas(&document, config.width, config.height)?;
    setup_app(window, document, canvas, config).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    config: AppConfig,
) -> Result<(), JsValue> {
    let gpu = GpuContext::for_canvas(&canvas, config.width, config.height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

    let mut renderer = WgpuRenderer::new(gpu);
    let mut driver = FrameDriver::with_playground(&config, &mut renderer);
    let input = Rc::new(RefCell::new(InputState::new(config.key_match)));
    let listeners = setup_input_listeners(&window, &document, &canvas, &input)?;
    info!(debug = config.debug, key_match = ?config.key_match, "cubeyard started");

    AnimationLoop::new(window, move |now_ms| {
        // listeners live exactly as long as the frame loop
        let _listeners = &listeners;
        let mut input = input.borrow_mut();
        driver.frame(&mut input, now_ms, &mut renderer);
    })
    .start()
}

/// Event listeners that are removed from their targets when the set is dropped.
#[cfg(target_arch = "wasm32")]
struct ListenerSet {
    listeners: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

#[cfg(target_arch = "wasm32")]
impl ListenerSet {
    fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    fn listen<E>(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        mut handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue>
    where
        E: JsCast + 'static,
    {
        let closure = Closure::wrap(Box::new(move |e: Event| {
            if let Ok(e) = e.dyn_into::<E>() {
                handler(e);
            }
        }) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        self.listeners.push((target.clone(), kind, closure));
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for ListenerSet {
    fn drop(&mut self) {
        for (target, kind, closure) in self.listeners.drain(..) {
            let _ = target.remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        }
    }
}

/// Wire browser events into the shared input state. Handlers only record input.
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
    input: &Rc<RefCell<InputState>>,
) -> Result<ListenerSet, JsValue> {
    let mut set = ListenerSet::new();

    // Keyboard
    {
        let input = input.clone();
        set.listen(document, "keydown", move |e: KeyboardEvent| {
            if matches!(e.key().as_str(), "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" | " ") {
                e.prevent_default();
            }
            input.borrow_mut().process_event(&web_input::keyboard_event_to_input(&e, true));
        })?;
    }
    {
        let input = input.clone();
        set.listen(document, "keyup", move |e: KeyboardEvent| {
            input.borrow_mut().process_event(&web_input::keyboard_event_to_input(&e, false));
        })?;
    }

    // Pointer: press on the canvas, release and move anywhere so drags may leave it
    {
        let input = input.clone();
        set.listen(canvas, "mousedown", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_button_to_input(&e, true));
        })?;
    }
    {
        let input = input.clone();
        set.listen(document, "mouseup", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_button_to_input(&e, false));
        })?;
    }
    {
        let input = input.clone();
        set.listen(document, "mousemove", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_move_to_input(&e));
        })?;
    }
    set.listen(canvas, "contextmenu", |e: MouseEvent| e.prevent_default())?;

    // Resize
    {
        let input = input.clone();
        let window_for_size = window.clone();
        let canvas = canvas.clone();
        set.listen(window, "resize", move |_e: Event| {
            if let Some((width, height)) = window_size(&window_for_size) {
                canvas.set_width(width);
                canvas.set_height(height);
                input.borrow_mut().process_event(&InputEvent::Resize { width, height });
            }
        })?;
    }

    // Focus loss - release everything
    {
        let input = input.clone();
        set.listen(window, "blur", move |_e: Event| {
            input.borrow_mut().process_event(&InputEvent::FocusLost);
        })?;
    }
    {
        let input = input.clone();
        let document_for_state = document.clone();
        set.listen(document, "visibilitychange", move |_e: Event| {
            if document_for_state.hidden() {
                input.borrow_mut().process_event(&InputEvent::FocusLost);
            }
        })?;
    }

    Ok(set)
}

#[cfg(target_arch = "wasm32")]
fn window_size(window: &Window) -> Option<(u32, u32)> {
    let width = window.inner_width().ok()?.as_f64()? as u32;
    let height = window.inner_height().ok()?.as_f64()? as u32;
    (width > 0 && height > 0).then_some((width, height))
}

#[cfg(target_arch = "wasm32")]
fn init_canvas(document: &Document, width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let body = document.body().ok_or_else(|| js_error("no body on document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas.set_width(width);
    canvas.set_height(height);
    body.append_child(&canvas)?;
    Ok(canvas)
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// `requestAnimationFrame` loop around a per-frame callback.
#[cfg(target_arch = "wasm32")]
struct AnimationLoop {
    window: Window,
    tick: Box<dyn FnMut(f64)>,
}

#[cfg(target_arch = "wasm32")]
impl AnimationLoop {
    fn new(window: Window, tick: impl FnMut(f64) + 'static) -> Self {
        Self { window, tick: Box::new(tick) }
    }

    fn start(self) -> Result<(), JsValue> {
        let AnimationLoop { window, mut tick } = self;

        let slot = Rc::new(RefCell::new(None::<Closure<dyn FnMut(f64)>>));
        let next = slot.clone();
        let window_for_loop = window.clone();

        *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
            tick(now_ms);

            if let Some(callback) = next.borrow().as_ref() {
                if let Err(e) = window_for_loop.request_animation_frame(callback.as_ref().unchecked_ref()) {
                    error!("requestAnimationFrame failed, stopping: {e:?}");
                }
            }
        }) as Box<dyn FnMut(f64)>));

        if let Some(callback) = slot.borrow().as_ref() {
            window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        }
        // the closure owns a handle to its own slot, so the loop outlives this call
        Ok(())
    }
}
