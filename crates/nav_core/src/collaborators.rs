//! Seams between the controller and the page it drives.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::ElementRef,
    protocol::{ContentPayload, LocationChange},
};

/// Click delivered to an activation handler.
#[derive(Debug, Default)]
pub struct Activation {
    default_prevented: bool,
}

impl Activation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub type ActivationHandler = Arc<dyn Fn(ElementRef, &mut Activation) + Send + Sync>;
pub type LocationHandler = Arc<dyn Fn(&LocationChange) + Send + Sync>;

/// Element queries and mutations, plus the two document-level effects the
/// controller needs (title and full page load).
#[async_trait]
pub trait Dom: Send + Sync {
    /// Descendants of `scope` matching `selector`, in document order.
    fn find_all(&self, scope: ElementRef, selector: &str) -> Vec<ElementRef>;
    fn attr(&self, element: ElementRef, name: &str) -> Option<String>;
    /// `element` itself or its nearest ancestor matching `selector`.
    fn closest(&self, element: ElementRef, selector: &str) -> Option<ElementRef>;
    fn add_class(&self, element: ElementRef, class: &str);
    fn remove_class(&self, element: ElementRef, class: &str);
    fn empty(&self, element: ElementRef);
    fn append(&self, element: ElementRef, html: &str);
    async fn fade_out(&self, element: ElementRef);
    async fn fade_in(&self, element: ElementRef);
    fn bind_activation(&self, element: ElementRef, handler: ActivationHandler);
    fn set_title(&self, title: &str);
    /// Leave the application: a real, full navigation to `url`.
    fn load_page(&self, url: &str);
}

/// Records logical locations and reports changes, including back/forward.
pub trait HistoryFacade: Send + Sync {
    fn push_location(&self, title: Option<&str>, url: &str);
    fn current_location(&self) -> String;
    fn on_location_change(&self, handler: LocationHandler);
}

/// Pure function of `(template_id, data)`; fails for unknown templates.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_id: &str, data: &Value) -> Result<String>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `{ content }` for a logical location, bypassing caches.
    async fn fetch_json(&self, url: &str) -> Result<ContentPayload>;
}
