//! Shared widget contract and the state every widget composes.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use vizkit_core::dimensions::{compute_dimensions, Dimensions, LayoutKind};
use vizkit_core::{VizError, WidgetConfig, WidgetKind};

use crate::dom::{Dom, DomError, EventKind, Handler, PointerEvent, Propagation, Subtree};
use crate::fetch::{Fetch, FetchError, FetchOutcome, LoadingGuard};
use crate::overlay::{self, OverlayContent};
use crate::styles;

const EMPHASIS_STROKE: &str = "#11181c";

/// Capability set every widget implements.
pub trait UiElement {
    type Record;

    /// Fetches the stored source and replaces the records. Never fails; a call made
    /// while another is pending returns [`FetchOutcome::InFlight`] at once.
    fn obtain_datas(&self) -> LocalBoxFuture<'_, FetchOutcome>;

    /// Replaces the records without touching the network.
    fn set_datas(&self, records: Vec<Self::Record>);

    /// Rebuilds the chart from scratch in the host container.
    fn render(&self) -> RenderOutcome;

    /// Removes everything the widget mounted. The instance is not reusable afterwards.
    fn destroy(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RenderOutcome {
    Drawn { marks: usize },
    Skipped(SkipReason),
}

impl RenderOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, RenderOutcome::Drawn { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Host container measured zero width; the container was left untouched.
    ZeroWidth,
    Destroyed,
    /// Calendar year outside the representable date range.
    OutOfRange,
    /// A DOM call failed midway; the partial subtree was discarded.
    Dom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayKind {
    Tooltip,
    Modal,
}

struct Overlay<D: Dom> {
    kind: OverlayKind,
    key: usize,
    _tree: Subtree<D>,
}

/// State and lifecycle steps shared by all widgets.
pub struct WidgetCore<D: Dom, F: Fetch, R> {
    kind: WidgetKind,
    dom: D,
    fetcher: F,
    container: D::Node,
    config: WidgetConfig,
    source: RefCell<String>,
    records: RefCell<Vec<R>>,
    loading: Cell<bool>,
    mounted: RefCell<Option<Subtree<D>>>,
    overlay: RefCell<Option<Overlay<D>>>,
    destroyed: Cell<bool>,
    generation: Cell<u64>,
}

impl<D: Dom, F: Fetch, R> WidgetCore<D, F, R> {
    pub fn new(
        kind: WidgetKind,
        dom: D,
        fetcher: F,
        container: D::Node,
        source: impl Into<String>,
        config: WidgetConfig,
    ) -> Self {
        Self {
            kind,
            dom,
            fetcher,
            container,
            config,
            source: RefCell::new(source.into()),
            records: RefCell::new(Vec::new()),
            loading: Cell::new(false),
            mounted: RefCell::new(None),
            overlay: RefCell::new(None),
            destroyed: Cell::new(false),
            generation: Cell::new(0),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn container(&self) -> &D::Node {
        &self.container
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn source(&self) -> String {
        self.source.borrow().clone()
    }

    pub fn set_source(&self, source: impl Into<String>) {
        *self.source.borrow_mut() = source.into();
    }

    pub fn records(&self) -> Ref<'_, Vec<R>> {
        self.records.borrow()
    }

    pub fn set_records(&self, records: Vec<R>) {
        *self.records.borrow_mut() = records;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Number of chart generations mounted so far.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Single-flight fetch of `url` through `transform`.
    pub async fn acquire<T>(&self, url: String, transform: T) -> FetchOutcome
    where
        T: Fn(&Value, &WidgetConfig) -> Result<Vec<R>, VizError>,
    {
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            debug!(widget = %self.kind, %url, "fetch already in flight, skipping");
            return FetchOutcome::InFlight;
        };

        let result = match self.fetcher.get(&url).await {
            Ok(response) if !response.is_success() => Err(FetchError::Status {
                url: url.clone(),
                status: response.status,
            }),
            Ok(response) => serde_json::from_str::<Value>(&response.body)
                .map_err(|err| VizError::Parse(err.to_string()))
                .and_then(|payload| transform(&payload, &self.config))
                .map_err(|source| FetchError::Payload {
                    url: url.clone(),
                    source,
                }),
            Err(err) => Err(err),
        };

        match result {
            Ok(records) => {
                let count = records.len();
                debug!(widget = %self.kind, %url, count, "records loaded");
                self.set_records(records);
                FetchOutcome::Loaded(count)
            }
            Err(err) => {
                warn!(widget = %self.kind, error = %err, "could not obtain data");
                self.records.borrow_mut().clear();
                FetchOutcome::Failed
            }
        }
    }

    /// Measures the host and sizes the chart. On failure nothing is touched.
    pub fn prepare(&self, layout: LayoutKind) -> Result<Dimensions, SkipReason> {
        if self.is_destroyed() {
            warn!(widget = %self.kind, "render called after destroy");
            return Err(SkipReason::Destroyed);
        }
        let host = self.dom.measure(&self.container);
        compute_dimensions(host, layout, &self.config).map_err(|err| {
            match err {
                VizError::ZeroWidth => warn!(
                    widget = %self.kind,
                    width = host.width,
                    "host container below minimum dimensions, render aborted"
                ),
                other => warn!(widget = %self.kind, error = %other, "render aborted"),
            }
            SkipReason::ZeroWidth
        })
    }

    /// Disposes the previous generation and hands out an empty subtree for the next.
    pub fn begin(&self) -> Subtree<D> {
        self.hide_overlay();
        let previous = self.mounted.borrow_mut().take();
        drop(previous);
        if let Err(err) = self.dom.install_stylesheet(styles::STYLE_KEY, styles::DEFAULT_STYLES) {
            debug!(error = %err, "stylesheet not installed");
        }
        Subtree::new(&self.dom)
    }

    /// Keeps `tree` mounted until the next render or destroy.
    pub fn commit(&self, tree: Subtree<D>, marks: usize) -> RenderOutcome {
        *self.mounted.borrow_mut() = Some(tree);
        self.generation.set(self.generation.get() + 1);
        debug!(widget = %self.kind, marks, generation = self.generation.get(), "rendered");
        RenderOutcome::Drawn { marks }
    }

    /// Logs a failed build; the partial subtree has already been dropped by the caller.
    pub fn abandon(&self, err: DomError) -> RenderOutcome {
        warn!(widget = %self.kind, error = %err, "render failed");
        RenderOutcome::Skipped(SkipReason::Dom)
    }

    pub(crate) fn show_overlay(&self, kind: OverlayKind, key: usize, tree: Subtree<D>) {
        let previous = self.overlay.borrow_mut().replace(Overlay {
            kind,
            key,
            _tree: tree,
        });
        drop(previous);
    }

    /// Key of the overlay currently shown, if it is of `kind`.
    pub(crate) fn overlay_key(&self, kind: OverlayKind) -> Option<usize> {
        self.overlay
            .borrow()
            .as_ref()
            .filter(|overlay| overlay.kind == kind)
            .map(|overlay| overlay.key)
    }

    pub fn hide_overlay(&self) {
        let previous = self.overlay.borrow_mut().take();
        drop(previous);
    }

    pub(crate) fn hide_tooltip(&self) {
        if self.overlay_key(OverlayKind::Tooltip).is_some() {
            self.hide_overlay();
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.borrow().is_some()
    }

    pub fn destroy(&self) {
        self.hide_overlay();
        let previous = self.mounted.borrow_mut().take();
        drop(previous);
        self.dom.clear_children(&self.container);
        self.destroyed.set(true);
        debug!(widget = %self.kind, "destroyed");
    }
}

/// What clicking a mark opens.
pub(crate) enum MarkClick {
    Tooltip(OverlayContent),
    Modal(OverlayContent),
    Nothing,
}

impl<D: Dom, F: Fetch, R: 'static> WidgetCore<D, F, R> {
    /// Hover emphasis on `node`, plus the click behaviour. Click handlers stop
    /// propagation so the document-level close handler does not undo them.
    pub(crate) fn wire_mark(
        self: &Rc<Self>,
        tree: &mut Subtree<D>,
        node: &D::Node,
        key: usize,
        click: MarkClick,
    ) -> Result<(), DomError> {
        let weak = Rc::downgrade(self);
        let target = node.clone();
        tree.listen(
            node,
            EventKind::PointerEnter,
            with_core(&weak, move |core, _| {
                core.emphasize(&target, true);
                Propagation::Continue
            }),
        )?;

        let target = node.clone();
        tree.listen(
            node,
            EventKind::PointerLeave,
            with_core(&weak, move |core, _| {
                core.emphasize(&target, false);
                core.hide_tooltip();
                Propagation::Continue
            }),
        )?;

        let handler = match click {
            MarkClick::Tooltip(content) => with_core(&weak, move |core, event| {
                core.toggle_tooltip(key, &content, event);
                Propagation::Stop
            }),
            MarkClick::Modal(content) => with_core(&weak, move |core, _| {
                core.open_modal(key, &content);
                Propagation::Stop
            }),
            MarkClick::Nothing => return Ok(()),
        };
        tree.listen(node, EventKind::Click, handler)
    }

    /// Document-level click closes whatever overlay is open.
    pub(crate) fn wire_document(self: &Rc<Self>, tree: &mut Subtree<D>) -> Result<(), DomError> {
        let body = self.dom.body()?;
        tree.listen(
            &body,
            EventKind::Click,
            with_core(&Rc::downgrade(self), |core, _| {
                core.hide_overlay();
                Propagation::Continue
            }),
        )
    }

    fn emphasize(&self, node: &D::Node, on: bool) {
        let result = if on {
            self.dom
                .set_attribute(node, "stroke", EMPHASIS_STROKE)
                .and_then(|_| self.dom.set_attribute(node, "stroke-width", "2"))
        } else {
            self.dom
                .remove_attribute(node, "stroke")
                .and_then(|_| self.dom.remove_attribute(node, "stroke-width"))
        };
        if let Err(err) = result {
            debug!(widget = %self.kind, error = %err, "hover emphasis failed");
        }
    }

    fn toggle_tooltip(&self, key: usize, content: &OverlayContent, event: &PointerEvent) {
        if self.overlay_key(OverlayKind::Tooltip) == Some(key) {
            self.hide_overlay();
            return;
        }
        match overlay::tooltip(&self.dom, content, event) {
            Ok(tree) => self.show_overlay(OverlayKind::Tooltip, key, tree),
            Err(err) => debug!(widget = %self.kind, error = %err, "tooltip not shown"),
        }
    }

    fn open_modal(self: &Rc<Self>, key: usize, content: &OverlayContent) {
        let on_close = with_core(&Rc::downgrade(self), |core, _| {
            core.hide_overlay();
            Propagation::Stop
        });
        match overlay::modal(&self.dom, content, on_close) {
            Ok(tree) => self.show_overlay(OverlayKind::Modal, key, tree),
            Err(err) => debug!(widget = %self.kind, error = %err, "modal not shown"),
        }
    }
}

/// Handler that runs `f` while the widget is alive and is inert afterwards.
fn with_core<D, F, R, H>(weak: &Weak<WidgetCore<D, F, R>>, f: H) -> Handler
where
    D: Dom,
    F: Fetch,
    R: 'static,
    H: Fn(&Rc<WidgetCore<D, F, R>>, &PointerEvent) -> Propagation + 'static,
{
    let weak = weak.clone();
    Rc::new(move |event: &PointerEvent| match weak.upgrade() {
        Some(core) => f(&core, event),
        None => Propagation::Continue,
    })
}
