use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::ElementRef;
use tracing::debug;

use crate::{
    collaborators::{Activation, ActivationHandler, Dom},
    lock,
};

/// Content and document effects, recorded in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    FadeOutStarted(ElementRef),
    FadeOutFinished(ElementRef),
    Emptied(ElementRef),
    Appended(ElementRef, String),
    FadeInFinished(ElementRef),
    TitleSet(String),
    PageLoaded(String),
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    parent: Option<ElementRef>,
    children: Vec<ElementRef>,
    fragments: Vec<String>,
    visible: bool,
}

impl Node {
    fn new(tag: &str, parent: Option<ElementRef>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            parent,
            children: Vec::new(),
            fragments: Vec::new(),
            visible: true,
        }
    }
}

struct Selector<'a> {
    tag: Option<&'a str>,
    class: Option<&'a str>,
}

impl<'a> Selector<'a> {
    /// Supports `tag`, `.class` and `tag.class`.
    fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        let (tag, class) = match raw.split_once('.') {
            Some((tag, class)) => (tag, Some(class)),
            None => (raw, None),
        };
        Self {
            tag: (!tag.is_empty()).then_some(tag),
            class: class.filter(|class| !class.is_empty()),
        }
    }

    fn matches(&self, node: &Node) -> bool {
        self.tag.map_or(true, |tag| node.tag.eq_ignore_ascii_case(tag))
            && self
                .class
                .map_or(true, |class| node.classes.iter().any(|c| c == class))
    }
}

struct MemoryDomState {
    nodes: HashMap<ElementRef, Node>,
    next_id: u64,
    handlers: HashMap<ElementRef, Vec<ActivationHandler>>,
    title: String,
    ops: Vec<DomOp>,
}

/// Element tree held in memory. Fades complete after a fixed duration.
pub struct MemoryDom {
    inner: Mutex<MemoryDomState>,
    fade_duration: Duration,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(Self::ROOT, Node::new("body", None));
        Self {
            inner: Mutex::new(MemoryDomState {
                nodes,
                next_id: 1,
                handlers: HashMap::new(),
                title: String::new(),
                ops: Vec::new(),
            }),
            fade_duration: Duration::ZERO,
        }
    }

    pub const ROOT: ElementRef = ElementRef(0);

    pub fn with_fade_duration(mut self, fade_duration: Duration) -> Self {
        self.fade_duration = fade_duration;
        self
    }

    pub fn root(&self) -> ElementRef {
        Self::ROOT
    }

    /// Appends a new element under `parent`. Unknown parents yield a detached element.
    pub fn create_element(&self, parent: ElementRef, tag: &str) -> ElementRef {
        let mut inner = lock(&self.inner);
        let id = ElementRef(inner.next_id);
        inner.next_id += 1;
        let parent = match inner.nodes.get_mut(&parent) {
            Some(node) => {
                node.children.push(id);
                Some(parent)
            }
            None => None,
        };
        inner.nodes.insert(id, Node::new(tag, parent));
        id
    }

    pub fn set_attr(&self, element: ElementRef, name: &str, value: &str) {
        if let Some(node) = lock(&self.inner).nodes.get_mut(&element) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn has_class(&self, element: ElementRef, class: &str) -> bool {
        lock(&self.inner)
            .nodes
            .get(&element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    pub fn content(&self, element: ElementRef) -> String {
        lock(&self.inner)
            .nodes
            .get(&element)
            .map(|node| node.fragments.concat())
            .unwrap_or_default()
    }

    pub fn is_visible(&self, element: ElementRef) -> bool {
        lock(&self.inner)
            .nodes
            .get(&element)
            .is_some_and(|node| node.visible)
    }

    pub fn title(&self) -> String {
        lock(&self.inner).title.clone()
    }

    pub fn page_loads(&self) -> Vec<String> {
        lock(&self.inner)
            .ops
            .iter()
            .filter_map(|op| match op {
                DomOp::PageLoaded(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn operations(&self) -> Vec<DomOp> {
        lock(&self.inner).ops.clone()
    }

    /// Simulates a user click. Returns whether a handler suppressed the
    /// default action; an unsuppressed click on a link loads its href.
    pub fn click(&self, element: ElementRef) -> bool {
        let (handlers, href) = {
            let inner = lock(&self.inner);
            let handlers = inner.handlers.get(&element).cloned().unwrap_or_default();
            let href = inner
                .nodes
                .get(&element)
                .and_then(|node| node.attrs.get("href").cloned());
            (handlers, href)
        };

        let mut activation = Activation::new();
        for handler in handlers {
            handler(element, &mut activation);
        }

        let prevented = activation.is_default_prevented();
        if !prevented {
            if let Some(href) = href {
                self.load_page(&href);
            }
        }
        prevented
    }

    fn record(&self, op: DomOp) {
        lock(&self.inner).ops.push(op);
    }

    fn set_visible(&self, element: ElementRef, visible: bool) {
        if let Some(node) = lock(&self.inner).nodes.get_mut(&element) {
            node.visible = visible;
        }
    }

    fn collect_matching(
        state: &MemoryDomState,
        element: ElementRef,
        selector: &Selector<'_>,
        out: &mut Vec<ElementRef>,
    ) {
        let Some(node) = state.nodes.get(&element) else {
            return;
        };
        for child in &node.children {
            if state
                .nodes
                .get(child)
                .is_some_and(|child_node| selector.matches(child_node))
            {
                out.push(*child);
            }
            Self::collect_matching(state, *child, selector, out);
        }
    }
}

#[async_trait]
impl Dom for MemoryDom {
    fn find_all(&self, scope: ElementRef, selector: &str) -> Vec<ElementRef> {
        let selector = Selector::parse(selector);
        let inner = lock(&self.inner);
        let mut out = Vec::new();
        Self::collect_matching(&inner, scope, &selector, &mut out);
        out
    }

    fn attr(&self, element: ElementRef, name: &str) -> Option<String> {
        lock(&self.inner)
            .nodes
            .get(&element)
            .and_then(|node| node.attrs.get(name).cloned())
    }

    fn closest(&self, element: ElementRef, selector: &str) -> Option<ElementRef> {
        let selector = Selector::parse(selector);
        let inner = lock(&self.inner);
        let mut current = Some(element);
        while let Some(id) = current {
            let node = inner.nodes.get(&id)?;
            if selector.matches(node) {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    fn add_class(&self, element: ElementRef, class: &str) {
        if let Some(node) = lock(&self.inner).nodes.get_mut(&element) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, element: ElementRef, class: &str) {
        if let Some(node) = lock(&self.inner).nodes.get_mut(&element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn empty(&self, element: ElementRef) {
        let mut inner = lock(&self.inner);
        if let Some(node) = inner.nodes.get_mut(&element) {
            node.children.clear();
            node.fragments.clear();
        }
        inner.ops.push(DomOp::Emptied(element));
    }

    fn append(&self, element: ElementRef, html: &str) {
        let mut inner = lock(&self.inner);
        if let Some(node) = inner.nodes.get_mut(&element) {
            node.fragments.push(html.to_string());
        }
        inner.ops.push(DomOp::Appended(element, html.to_string()));
    }

    async fn fade_out(&self, element: ElementRef) {
        self.record(DomOp::FadeOutStarted(element));
        if !self.fade_duration.is_zero() {
            tokio::time::sleep(self.fade_duration).await;
        }
        self.set_visible(element, false);
        self.record(DomOp::FadeOutFinished(element));
    }

    async fn fade_in(&self, element: ElementRef) {
        self.set_visible(element, true);
        if !self.fade_duration.is_zero() {
            tokio::time::sleep(self.fade_duration).await;
        }
        self.record(DomOp::FadeInFinished(element));
    }

    fn bind_activation(&self, element: ElementRef, handler: ActivationHandler) {
        lock(&self.inner)
            .handlers
            .entry(element)
            .or_default()
            .push(handler);
    }

    fn set_title(&self, title: &str) {
        let mut inner = lock(&self.inner);
        inner.title = title.to_string();
        inner.ops.push(DomOp::TitleSet(title.to_string()));
    }

    fn load_page(&self, url: &str) {
        debug!(url, "full page load");
        self.record(DomOp::PageLoaded(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn find_all_returns_descendants_in_document_order() {
        let dom = MemoryDom::new();
        let nav = dom.create_element(dom.root(), "ul");
        let first = dom.create_element(nav, "li");
        let nested = dom.create_element(first, "ul");
        let inner = dom.create_element(nested, "li");
        let second = dom.create_element(nav, "li");

        assert_eq!(dom.find_all(nav, "li"), vec![first, inner, second]);
        assert_eq!(dom.closest(inner, "li"), Some(inner));
        assert_eq!(dom.closest(nested, "li"), Some(first));
        assert_eq!(dom.closest(nav, "li"), None);
    }

    #[test]
    fn class_selectors_match_tag_and_class() {
        let dom = MemoryDom::new();
        let nav = dom.create_element(dom.root(), "ul");
        let item = dom.create_element(nav, "li");
        dom.add_class(item, "active");
        dom.add_class(item, "active");
        let other = dom.create_element(nav, "li");

        assert_eq!(dom.find_all(nav, "li.active"), vec![item]);
        assert_eq!(dom.find_all(nav, ".active"), vec![item]);
        dom.remove_class(item, "active");
        assert!(dom.find_all(nav, ".active").is_empty());
        assert!(!dom.has_class(other, "active"));
    }

    #[test]
    fn unprevented_click_on_link_loads_href() {
        let dom = MemoryDom::new();
        let link = dom.create_element(dom.root(), "a");
        dom.set_attr(link, "href", "/elsewhere");

        assert!(!dom.click(link));
        assert_eq!(dom.page_loads(), vec!["/elsewhere".to_string()]);
    }

    #[test]
    fn prevented_click_keeps_page() {
        let dom = MemoryDom::new();
        let link = dom.create_element(dom.root(), "a");
        dom.set_attr(link, "href", "/elsewhere");
        dom.bind_activation(
            link,
            Arc::new(|_: ElementRef, activation: &mut Activation| {
                activation.prevent_default()
            }),
        );

        assert!(dom.click(link));
        assert!(dom.page_loads().is_empty());
    }

    #[tokio::test]
    async fn fades_toggle_visibility_and_record_completion() {
        let dom = MemoryDom::new();
        let pane = dom.create_element(dom.root(), "div");
        dom.fade_out(pane).await;
        assert!(!dom.is_visible(pane));
        dom.fade_in(pane).await;
        assert!(dom.is_visible(pane));
        assert_eq!(
            dom.operations(),
            vec![
                DomOp::FadeOutStarted(pane),
                DomOp::FadeOutFinished(pane),
                DomOp::FadeInFinished(pane),
            ]
        );
    }
}
