//! Menu markup for the shell, described in TOML and mounted into a
//! [`MemoryDom`].

use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use nav_core::MemoryDom;
use serde::Deserialize;
use shared::domain::ElementRef;

use crate::templates::HandlebarsTemplates;

#[derive(Debug, Clone, Deserialize)]
pub struct MenuItem {
    pub href: Option<String>,
    pub template_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuFile {
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default)]
    pub templates: HashMap<String, String>,
}

/// Elements created by [`MenuFile::mount`].
pub struct MountedMenu {
    pub nav: ElementRef,
    pub content: ElementRef,
    links: Vec<(String, ElementRef)>,
}

impl MountedMenu {
    /// First link whose href is exactly `href`.
    pub fn link(&self, href: &str) -> Option<ElementRef> {
        self.links
            .iter()
            .find(|(candidate, _)| candidate == href)
            .map(|(_, link)| *link)
    }
}

impl MenuFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read menu file '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid menu file '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Builds `ul > li > a` for every item plus an empty content pane.
    pub fn mount(&self, dom: &MemoryDom) -> MountedMenu {
        let nav = dom.create_element(dom.root(), "ul");
        let mut links = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let list_item = dom.create_element(nav, "li");
            let link = dom.create_element(list_item, "a");
            if let Some(href) = &item.href {
                dom.set_attr(link, "href", href);
                links.push((href.clone(), link));
            }
            if let Some(template_id) = &item.template_id {
                dom.set_attr(link, "data-template-id", template_id);
            }
            if let Some(title) = &item.title {
                dom.set_attr(link, "data-title-tag", title);
            }
        }
        let content = dom.create_element(dom.root(), "main");
        MountedMenu {
            nav,
            content,
            links,
        }
    }

    pub fn renderer(&self) -> anyhow::Result<HandlebarsTemplates> {
        HandlebarsTemplates::new(&self.templates)
    }
}
