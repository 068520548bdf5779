#![forbid(unsafe_code)]

//! DOM bindings for [`FolioPage`].
//!
//! Anchors are found by fixed element ids and class names; any that are
//! missing simply leave their effect inert. Reveal elements, counters and
//! skill bars are watched by an `IntersectionObserver`; without one they are
//! all treated as visible.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use folio_core::capability::HostSignals;
use folio_core::clock::millis_to_duration;
use folio_core::error::FolioError;
use folio_core::geometry::{Point, Viewport};
use folio_fx::counter::CounterSpec;
use folio_fx::effect::PointerEvent;
use folio_fx::surface::{ElementSink, Surface, TerminalSink, Transform};
use folio_fx::terminal::LineStyle;
use folio_fx::tilt::CardRect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, Window,
};

use crate::config::FxConfig;
use crate::page::{Anchor, AnchorId, FolioPage, PerfSignal};

/// Attribute carrying an element's [`AnchorId`].
const ANCHOR_ATTR: &str = "data-folio-anchor";

const ACCENT: &str = "#00ff9c";
const BACKGROUND: &str = "#0a0e14";

/// [`Surface`] over a 2D canvas context.
struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
}

impl CanvasSurface {
    fn from_element(element: Element) -> Option<Self> {
        let canvas = element.dyn_into::<HtmlCanvasElement>().ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self {
            canvas,
            ctx,
            viewport: Viewport::default(),
        })
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.canvas.set_width(viewport.width as u32);
        self.canvas.set_height(viewport.height as u32);
    }

    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "block" } else { "none" };
        let _ = self.canvas.style().set_property("display", display);
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
    }

    fn fade(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx
            .fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        self.ctx.set_global_alpha(1.0);
    }

    fn circle(&mut self, center: Point, radius: f64, alpha: f64, glow: bool) {
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_fill_style_str(ACCENT);
        if glow {
            self.ctx.set_shadow_blur(radius * 4.0);
            self.ctx.set_shadow_color(ACCENT);
        }
        self.ctx.begin_path();
        let _ = self.ctx.arc(center.x, center.y, radius, 0.0, TAU);
        self.ctx.fill();
        if glow {
            self.ctx.set_shadow_blur(0.0);
        }
        self.ctx.set_global_alpha(1.0);
    }

    fn line(&mut self, from: Point, to: Point, alpha: f64, width: f64) {
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_stroke_style_str(ACCENT);
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
        self.ctx.set_global_alpha(1.0);
    }

    fn glyph(&mut self, at: Point, ch: char, size: f64, brightness: f64) {
        let mut buf = [0u8; 4];
        self.ctx.set_global_alpha(brightness);
        self.ctx.set_fill_style_str(ACCENT);
        self.ctx.set_font(&format!("{size}px monospace"));
        let _ = self.ctx.fill_text(ch.encode_utf8(&mut buf), at.x, at.y + size);
        self.ctx.set_global_alpha(1.0);
    }

    fn band(&mut self, y: f64, height: f64, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
        self.ctx.set_fill_style_str("#ffffff");
        self.ctx.fill_rect(0.0, y, self.viewport.width, height);
        self.ctx.set_global_alpha(1.0);
    }
}

/// [`ElementSink`] over an HTML element's text and inline style.
struct DomElement(HtmlElement);

impl ElementSink for DomElement {
    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "" } else { "none" };
        let _ = self.0.style().set_property("display", display);
    }

    fn set_text(&mut self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_transform(&mut self, transform: Transform) {
        let css = match transform {
            Transform::Identity => String::new(),
            Transform::Translate(p) => format!("translate({}px, {}px)", p.x, p.y),
            Transform::Tilt {
                rotate_x,
                rotate_y,
                scale,
            } => format!(
                "perspective(1000px) rotateX({rotate_x}deg) rotateY({rotate_y}deg) scale({scale})"
            ),
        };
        let _ = self.0.style().set_property("transform", &css);
    }

    fn set_progress(&mut self, fraction: f64) {
        let width = format!("{:.1}%", fraction * 100.0);
        let _ = self.0.style().set_property("width", &width);
    }

    fn set_opacity(&mut self, opacity: f64) {
        let _ = self.0.style().set_property("opacity", &opacity.to_string());
    }

    fn bounds(&self) -> Option<CardRect> {
        let r = self.0.get_bounding_client_rect();
        Some(CardRect::new(r.left(), r.top(), r.width(), r.height()))
    }
}

/// [`TerminalSink`] appending one `div` per line.
struct DomTerminal {
    document: Document,
    body: HtmlElement,
}

impl TerminalSink for DomTerminal {
    fn push_line(&mut self, text: &str, style: LineStyle, blink: bool) {
        let Ok(line) = self.document.create_element("div") else {
            return;
        };
        let mut class = format!("terminal-line {}", style.as_str());
        if blink {
            class.push_str(" blink");
        }
        line.set_class_name(&class);
        line.set_text_content(Some(text));
        let _ = self.body.append_child(&line);
    }

    fn update_last_line(&mut self, text: &str) {
        if let Some(last) = self.body.last_element_child() {
            last.set_text_content(Some(text));
        }
    }

    fn set_cursor(&mut self, visible: bool) {
        let _ = self
            .body
            .set_attribute("data-cursor", if visible { "on" } else { "off" });
    }

    fn clear(&mut self) {
        self.body.set_inner_html("");
    }
}

fn html_by_id(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
}

fn canvas_by_id(document: &Document, id: &str) -> Option<Box<dyn Surface>> {
    let element = document.get_element_by_id(id)?;
    CanvasSurface::from_element(element).map(|s| Box::new(s) as Box<dyn Surface>)
}

fn by_class(document: &Document, class: &str) -> Vec<HtmlElement> {
    let collection = document.get_elements_by_class_name(class);
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .filter_map(|e| e.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn attr_f64(element: &HtmlElement, name: &str) -> Option<f64> {
    element.get_attribute(name)?.trim().parse().ok()
}

fn read_signals(window: &Window) -> HostSignals {
    let navigator = window.navigator();
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let mut signals = HostSignals::new(width);

    let cores = navigator.hardware_concurrency();
    if cores.is_finite() && cores >= 1.0 {
        signals = signals.cores(cores as u32);
    }
    if let Some(memory) = js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
        .ok()
        .and_then(|v| v.as_f64())
    {
        signals = signals.memory_gb(memory);
    }
    let reduced = window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .is_some_and(|mq| mq.matches());
    signals.reduced_motion(reduced)
}

fn read_viewport(window: &Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(dim(window.inner_width()), dim(window.inner_height()))
}

/// Bind every anchor present in `document`. Returns the elements whose
/// effects wait to be scrolled into view.
fn attach_anchors(page: &mut FolioPage, document: &Document) -> Vec<(AnchorId, HtmlElement)> {
    let mut watched = Vec::new();
    for (id, make) in [
        ("matrix-canvas", Anchor::MatrixCanvas as fn(Box<dyn Surface>) -> Anchor),
        ("neural-canvas", Anchor::NeuralCanvas),
        ("particles-canvas", Anchor::ParticlesCanvas),
        ("scanlines-canvas", Anchor::ScanlinesCanvas),
        ("graph-canvas", Anchor::GraphCanvas),
    ] {
        if let Some(surface) = canvas_by_id(document, id) {
            page.attach(make(surface));
        }
    }

    if let Some(el) = html_by_id(document, "glitch-text") {
        let text = el.text_content().unwrap_or_default();
        page.attach(Anchor::GlitchText {
            sink: Box::new(DomElement(el)),
            text,
        });
    }
    if let Some(el) = html_by_id(document, "typewriter-text") {
        page.attach(Anchor::Typewriter(Box::new(DomElement(el))));
    }
    if let Some(body) = html_by_id(document, "terminal-body") {
        page.attach(Anchor::Terminal(Box::new(DomTerminal {
            document: document.clone(),
            body,
        })));
    }
    if let Some(el) = html_by_id(document, "cursor-glow") {
        page.attach(Anchor::CursorGlow(Box::new(DomElement(el))));
    }

    for el in by_class(document, "reveal") {
        let id = page.attach(Anchor::Reveal(Box::new(DomElement(el.clone()))));
        watched.push((id, el));
    }
    for el in by_class(document, "stat-number") {
        let Some(target) = attr_f64(&el, "data-target") else {
            continue;
        };
        let mut spec = CounterSpec::new(target);
        if let Some(decimals) = attr_f64(&el, "data-decimals") {
            spec = spec.decimals(decimals.max(0.0) as usize);
        }
        if let Some(suffix) = el.get_attribute("data-suffix") {
            spec = spec.suffix(suffix);
        }
        let id = page.attach(Anchor::Counter {
            sink: Box::new(DomElement(el.clone())),
            spec,
        });
        watched.push((id, el));
    }
    for el in by_class(document, "skill-progress") {
        let percent = attr_f64(&el, "data-progress").unwrap_or(0.0);
        let id = page.attach(Anchor::SkillBar {
            sink: Box::new(DomElement(el.clone())),
            percent,
        });
        watched.push((id, el));
    }
    // Initial rect only; DomElement::bounds re-measures on pointer input.
    for el in by_class(document, "project-card") {
        let r = el.get_bounding_client_rect();
        page.attach(Anchor::Card {
            rect: CardRect::new(r.left(), r.top(), r.width(), r.height()),
            sink: Box::new(DomElement(el)),
        });
    }
    watched
}

/// Queues the anchor ids of watched elements as they scroll into view.
/// Each element is reported once; the queue is drained every frame.
struct RevealObserver {
    observer: IntersectionObserver,
    seen: Rc<RefCell<Vec<u32>>>,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl RevealObserver {
    /// `None` when the host has no `IntersectionObserver`.
    fn watch(targets: &[(AnchorId, HtmlElement)]) -> Option<Self> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let queue = Rc::clone(&seen);
        let callback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    if let Some(id) = target.get_attribute(ANCHOR_ATTR).and_then(|v| v.parse().ok()) {
                        queue.borrow_mut().push(id);
                    }
                }
            },
        )
            as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        for (id, el) in targets {
            let _ = el.set_attribute(ANCHOR_ATTR, &id.get().to_string());
            observer.observe(el);
        }
        Some(Self {
            observer,
            seen,
            _callback: callback,
        })
    }

    fn drain(&self) -> Vec<u32> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }
}

impl Drop for RevealObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// JS-facing page runtime.
///
/// The host owns the loop: call `frame(now)` from `requestAnimationFrame`,
/// `idle()` from `requestIdleCallback` when available, and forward resize and
/// pointer events.
#[wasm_bindgen]
pub struct FolioWeb {
    page: FolioPage,
    reveals: Option<RevealObserver>,
}

#[wasm_bindgen]
impl FolioWeb {
    /// Detect the device, bind anchors, and prepare the lifecycle.
    ///
    /// `config` is optional JSON; see `FxConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<FolioWeb, JsError> {
        let window = web_sys::window().ok_or(FolioError::Unsupported("window"))?;
        let document = window
            .document()
            .ok_or(FolioError::Unsupported("document"))?;
        let mut config = match config {
            Some(json) => FxConfig::from_json(&json)?,
            None => FxConfig::default(),
        };
        if js_sys::Reflect::has(&window, &JsValue::from_str("requestIdleCallback")).unwrap_or(false)
        {
            config.idle_supported = true;
        }

        let mut page =
            FolioPage::from_signals(read_signals(&window), read_viewport(&window), config);
        let watched = attach_anchors(&mut page, &document);
        let reveals = RevealObserver::watch(&watched);
        if reveals.is_none() {
            page.reveal_all();
        }
        Ok(Self { page, reveals })
    }

    /// Run the immediate phase.
    pub fn start(&mut self, now_ms: f64) {
        self.page.start(millis_to_duration(now_ms));
    }

    /// One animation frame.
    pub fn frame(&mut self, now_ms: f64) {
        if let Some(reveals) = &self.reveals {
            for id in reveals.drain() {
                self.page.reveal(AnchorId::from_raw(id));
            }
        }
        self.page.frame(millis_to_duration(now_ms));
    }

    /// Report one watched element (by its `data-folio-anchor` value) as in
    /// view, for hosts that run their own observer.
    pub fn reveal(&mut self, anchor: u32) {
        self.page.reveal(AnchorId::from_raw(anchor));
    }

    #[wasm_bindgen(js_name = revealAll)]
    pub fn reveal_all(&mut self) {
        self.page.reveal_all();
    }

    pub fn idle(&mut self) {
        self.page.idle();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.page.resize(Viewport::new(width, height));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.page.pointer(PointerEvent::Move(Point::new(x, y)));
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.page.pointer(PointerEvent::Leave);
    }

    #[wasm_bindgen(js_name = largestContentfulPaint)]
    pub fn largest_contentful_paint(&self, at_ms: f64) {
        self.page
            .performance_signal(PerfSignal::LargestContentfulPaint { at_ms });
    }

    #[wasm_bindgen(js_name = observerUnsupported)]
    pub fn observer_unsupported(&self) {
        self.page.performance_signal(PerfSignal::ObserverUnsupported);
    }

    /// Detected tier: `"low"`, `"mid"` or `"high"`.
    pub fn tier(&self) -> String {
        self.page.tier().as_str().to_owned()
    }

    /// Explicit teardown for JS callers. Returns the number of schedules
    /// cancelled.
    pub fn destroy(&mut self) -> u32 {
        self.reveals = None;
        self.page.destroy() as u32
    }
}
