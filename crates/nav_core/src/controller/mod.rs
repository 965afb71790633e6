//! Navigation controller: link interception, history reconciliation, and
//! content, menu and title refresh.
//!
//! Both inputs (link activation and history change) end in the same path:
//! resolve the active entry, fetch and render its content while the old
//! content fades out, then swap content, highlight the menu item and set the
//! title. Every cycle carries a [`NavSequence`]; a cycle that completes after
//! a newer one has started leaves the page untouched.

mod state;

use std::sync::{Arc, Mutex};

use futures::join;
use shared::{
    domain::{ElementRef, MenuEntry, NavSequence, SkippedEntry},
    protocol::{ContentPayload, LocationChange, NavEvent, NavOptions},
};
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, error, info, warn};

pub use state::{ActivePageState, CycleOutcome, CyclePhase, Dispatch, PendingCycle};

use crate::{
    collaborators::{Activation, Dom, HistoryFacade, TemplateRenderer, Transport},
    error::NavError,
    lock,
    menu::MenuIndex,
};

pub const ACTIVE_CLASS: &str = "active";
const EVENT_CAPACITY: usize = 64;

pub struct NavDependencies {
    pub dom: Arc<dyn Dom>,
    pub history: Arc<dyn HistoryFacade>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub transport: Arc<dyn Transport>,
}

struct ControllerState {
    page: ActivePageState,
    seq: NavSequence,
    phase: CyclePhase,
    initialized: bool,
}

pub struct NavController {
    dom: Arc<dyn Dom>,
    history: Arc<dyn HistoryFacade>,
    renderer: Arc<dyn TemplateRenderer>,
    transport: Arc<dyn Transport>,
    content: ElementRef,
    menu: MenuIndex,
    initial_model: Option<ContentPayload>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<NavEvent>,
}

impl NavController {
    /// Reads the menu under `menu_scope` once; entries never change afterwards.
    pub fn new(
        deps: NavDependencies,
        menu_scope: ElementRef,
        content: ElementRef,
        options: NavOptions,
    ) -> Arc<Self> {
        let menu = MenuIndex::extract(deps.dom.as_ref(), menu_scope);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            dom: deps.dom,
            history: deps.history,
            renderer: deps.renderer,
            transport: deps.transport,
            content,
            menu,
            initial_model: options.initial_model,
            inner: Mutex::new(ControllerState {
                page: ActivePageState::empty(),
                seq: NavSequence::ZERO,
                phase: CyclePhase::Idle,
                initialized: false,
            }),
            events,
        })
    }

    /// Wires link clicks and history changes, then renders the initial model
    /// if one was supplied. Must run inside a tokio runtime.
    pub fn initialize(self: &Arc<Self>) -> Result<(), NavError> {
        let runtime = Handle::try_current().map_err(|_| NavError::NoRuntime)?;
        {
            let mut inner = lock(&self.inner);
            if inner.initialized {
                return Err(NavError::AlreadyInitialized);
            }
            inner.initialized = true;
        }

        self.bind_links();
        self.bind_location_changes(runtime);
        if let Some(model) = &self.initial_model {
            self.render_initial_page(model)?;
        }

        info!(
            entries = self.menu.entries().len(),
            skipped = self.menu.skipped().len(),
            initial_model = self.initial_model.is_some(),
            "navigation controller initialized"
        );
        Ok(())
    }

    fn bind_links(self: &Arc<Self>) {
        for entry in self.menu.entries() {
            let weak = Arc::downgrade(self);
            self.dom.bind_activation(
                entry.link,
                Arc::new(move |link: ElementRef, activation: &mut Activation| {
                    if let Some(controller) = weak.upgrade() {
                        controller.activate_link(link, activation);
                    }
                }),
            );
        }
    }

    fn bind_location_changes(self: &Arc<Self>, runtime: Handle) {
        let weak = Arc::downgrade(self);
        self.history
            .on_location_change(Arc::new(move |change: &LocationChange| {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                debug!(reported = %change.url, "history change notification");
                if let Dispatch::Fetch(cycle) = controller.begin_navigation() {
                    runtime.spawn(async move {
                        // run_cycle logs and broadcasts its own failures.
                        let _ = controller.run_cycle(cycle).await;
                    });
                }
            }));
    }

    /// Handles a click on a menu link. Links outside the entry set keep
    /// their default behavior.
    pub fn activate_link(&self, link: ElementRef, activation: &mut Activation) {
        let Some(entry) = self.menu.entry_for_link(link) else {
            return;
        };
        activation.prevent_default();
        debug!(href = %entry.href, "menu link activated");
        self.history
            .push_location(Some(entry.title_tag.as_str()), &entry.href);
    }

    /// Resets the active state and selects the first entry, in document
    /// order, whose href is a suffix of `url`.
    pub fn resolve(&self, url: &str) -> Option<MenuEntry> {
        let mut inner = lock(&self.inner);
        self.resolve_into(&mut inner, url)
            .and_then(|index| self.menu.entry(index).cloned())
    }

    fn resolve_into(&self, state: &mut ControllerState, url: &str) -> Option<usize> {
        state.page = ActivePageState::empty();
        let index = self.menu.resolve(url)?;
        state.page = ActivePageState::matched(index, url);
        Some(index)
    }

    /// Synchronous half of a history change: resolves the façade's current
    /// location and either leaves the application or returns the cycle to run.
    pub fn begin_navigation(&self) -> Dispatch {
        let url = self.history.current_location();
        let (seq, matched) = {
            let mut inner = lock(&self.inner);
            inner.phase = CyclePhase::Resolving;
            inner.seq = inner.seq.next();
            let matched = self.resolve_into(&mut inner, &url);
            inner.phase = if matched.is_some() {
                CyclePhase::Fetching
            } else {
                CyclePhase::ExternalNavigation
            };
            (inner.seq, matched)
        };

        match matched.and_then(|index| self.menu.entry(index).map(|entry| (index, entry.clone())))
        {
            Some((entry_index, entry)) => {
                info!(
                    seq = seq.0,
                    %url,
                    template_id = %entry.template_id,
                    "soft navigation started"
                );
                Dispatch::Fetch(PendingCycle {
                    seq,
                    url,
                    entry_index,
                    entry,
                })
            }
            None => {
                info!(seq = seq.0, %url, "location matches no menu entry; full page load");
                self.dom.load_page(&url);
                self.emit(NavEvent::ExternalNavigation { url: url.clone() });
                Dispatch::External { url }
            }
        }
    }

    /// Asynchronous half: fade-out and fetch/render run together and the
    /// content swap waits for both.
    pub async fn run_cycle(&self, cycle: PendingCycle) -> Result<CycleOutcome, NavError> {
        if !self.is_current(&cycle) {
            return Ok(self.discard(&cycle));
        }

        let ((), rendered) = join!(
            self.dom.fade_out(self.content),
            self.fetch_and_render(&cycle)
        );

        let html = match rendered {
            Ok(html) => html,
            Err(err) => {
                if !self.settle_failure(&cycle) {
                    debug!(seq = cycle.seq.0, error = %err, "superseded cycle also failed");
                    return Ok(self.discard(&cycle));
                }
                self.dom.empty(self.content);
                error!(seq = cycle.seq.0, url = %cycle.url, error = %err, "navigation cycle failed");
                if let Some(failure) = err.failure() {
                    self.emit(NavEvent::CycleFailed {
                        seq: cycle.seq,
                        failure,
                    });
                }
                return Err(err);
            }
        };

        if !self.commit_rendered(&cycle, &html) {
            return Ok(self.discard(&cycle));
        }
        self.dom.empty(self.content);
        self.dom.append(self.content, &html);
        self.dom.fade_in(self.content).await;

        if !self.is_current(&cycle) {
            return Ok(self.discard(&cycle));
        }
        self.update_menu(&cycle.entry);
        self.update_title(&cycle.entry);
        self.set_phase(cycle.seq, CyclePhase::Synced);
        debug!(seq = cycle.seq.0, url = %cycle.url, "navigation synced");
        self.emit(NavEvent::Synced {
            seq: cycle.seq,
            url: cycle.url.clone(),
        });
        Ok(CycleOutcome::Synced { html })
    }

    async fn fetch_and_render(&self, cycle: &PendingCycle) -> Result<String, NavError> {
        let payload = self
            .transport
            .fetch_json(&cycle.url)
            .await
            .map_err(|source| NavError::Transport {
                url: cycle.url.clone(),
                source,
            })?;
        self.set_phase(cycle.seq, CyclePhase::Rendering);
        self.render(&cycle.entry, &cycle.url, &payload)
    }

    fn render(
        &self,
        entry: &MenuEntry,
        url: &str,
        payload: &ContentPayload,
    ) -> Result<String, NavError> {
        self.renderer
            .render(&entry.template_id, &payload.content)
            .map_err(|source| NavError::Template {
                template_id: entry.template_id.clone(),
                url: url.to_string(),
                source,
            })
    }

    fn render_initial_page(&self, model: &ContentPayload) -> Result<(), NavError> {
        let url = self.history.current_location();
        let Some(entry) = self.resolve(&url) else {
            warn!(%url, "initial location matches no menu entry; initial model not rendered");
            return Ok(());
        };

        let html = self.render(&entry, &url, model)?;
        {
            let mut inner = lock(&self.inner);
            let page = std::mem::take(&mut inner.page);
            inner.page = page.with_rendered(html.as_str());
            inner.phase = CyclePhase::Synced;
        }
        self.dom.append(self.content, &html);
        self.update_menu(&entry);
        self.update_title(&entry);
        debug!(%url, "initial model rendered without fetch");
        self.emit(NavEvent::InitialRendered { url });
        Ok(())
    }

    fn update_menu(&self, entry: &MenuEntry) {
        for item in self.menu.list_items() {
            if *item != entry.list_item {
                self.dom.remove_class(*item, ACTIVE_CLASS);
            }
        }
        self.dom.add_class(entry.list_item, ACTIVE_CLASS);
    }

    fn update_title(&self, entry: &MenuEntry) {
        self.dom.set_title(&entry.title_tag);
    }

    fn is_current(&self, cycle: &PendingCycle) -> bool {
        owns(&lock(&self.inner), cycle)
    }

    /// Stores the rendered content if `cycle` still owns the page state.
    fn commit_rendered(&self, cycle: &PendingCycle, html: &str) -> bool {
        let mut inner = lock(&self.inner);
        if !owns(&inner, cycle) {
            return false;
        }
        let page = std::mem::take(&mut inner.page);
        inner.page = page.with_rendered(html);
        true
    }

    /// Moves a failed cycle back to `Idle` if it still owns the page state.
    fn settle_failure(&self, cycle: &PendingCycle) -> bool {
        let mut inner = lock(&self.inner);
        if !owns(&inner, cycle) {
            return false;
        }
        inner.phase = CyclePhase::Idle;
        true
    }

    fn discard(&self, cycle: &PendingCycle) -> CycleOutcome {
        warn!(seq = cycle.seq.0, url = %cycle.url, "discarding superseded navigation result");
        self.emit(NavEvent::Discarded {
            seq: cycle.seq,
            url: cycle.url.clone(),
        });
        CycleOutcome::Discarded
    }

    fn set_phase(&self, seq: NavSequence, phase: CyclePhase) {
        let mut inner = lock(&self.inner);
        if inner.seq == seq {
            inner.phase = phase;
        }
    }

    fn emit(&self, event: NavEvent) {
        // No receivers is fine; the event is also logged.
        let _ = self.events.send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<NavEvent> {
        self.events.subscribe()
    }

    pub fn active_state(&self) -> ActivePageState {
        lock(&self.inner).page.clone()
    }

    pub fn active_entry(&self) -> Option<MenuEntry> {
        let index = lock(&self.inner).page.active_entry()?;
        self.menu.entry(index).cloned()
    }

    pub fn phase(&self) -> CyclePhase {
        lock(&self.inner).phase
    }

    pub fn sequence(&self) -> NavSequence {
        lock(&self.inner).seq
    }

    pub fn entries(&self) -> &[MenuEntry] {
        self.menu.entries()
    }

    pub fn skipped_entries(&self) -> &[SkippedEntry] {
        self.menu.skipped()
    }
}

fn owns(state: &ControllerState, cycle: &PendingCycle) -> bool {
    state.seq == cycle.seq && state.page.active_url() == Some(cycle.url.as_str())
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
