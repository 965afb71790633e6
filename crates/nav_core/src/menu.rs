//! Menu markup extraction and location-to-entry resolution.

use std::collections::HashSet;

use shared::domain::{ElementRef, MenuAttribute, MenuEntry, SkippedEntry};
use tracing::{debug, warn};

use crate::collaborators::Dom;

pub const LIST_ITEM_SELECTOR: &str = "li";
pub const LINK_SELECTOR: &str = "a";

/// Immutable entry set read from the menu once at construction.
#[derive(Debug, Clone, Default)]
pub struct MenuIndex {
    entries: Vec<MenuEntry>,
    skipped: Vec<SkippedEntry>,
    list_items: Vec<ElementRef>,
}

impl MenuIndex {
    pub fn extract(dom: &dyn Dom, scope: ElementRef) -> Self {
        let list_items = dom.find_all(scope, LIST_ITEM_SELECTOR);

        // Nested lists yield the same link under several items.
        let mut seen = HashSet::new();
        let links: Vec<ElementRef> = list_items
            .iter()
            .flat_map(|item| dom.find_all(*item, LINK_SELECTOR))
            .filter(|link| seen.insert(*link))
            .collect();

        let mut entries = Vec::with_capacity(links.len());
        let mut skipped = Vec::new();
        for (position, link) in links.into_iter().enumerate() {
            match read_entry(dom, link) {
                Ok(entry) => entries.push(entry),
                Err(missing) => {
                    warn!(
                        position,
                        attribute = missing.markup_name(),
                        "menu link is missing a required attribute; left to default navigation"
                    );
                    skipped.push(SkippedEntry {
                        link,
                        position,
                        missing,
                    });
                }
            }
        }

        debug!(
            entries = entries.len(),
            skipped = skipped.len(),
            list_items = list_items.len(),
            "menu entries extracted"
        );
        Self {
            entries,
            skipped,
            list_items,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<MenuEntry>) -> Self {
        let list_items = entries.iter().map(|entry| entry.list_item).collect();
        Self {
            entries,
            skipped: Vec::new(),
            list_items,
        }
    }

    /// Index of the first entry, in document order, whose href ends `url`.
    pub fn resolve(&self, url: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.matches(url))
    }

    pub fn entry(&self, index: usize) -> Option<&MenuEntry> {
        self.entries.get(index)
    }

    pub fn entry_for_link(&self, link: ElementRef) -> Option<&MenuEntry> {
        self.entries.iter().find(|entry| entry.link == link)
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn list_items(&self) -> &[ElementRef] {
        &self.list_items
    }
}

fn read_entry(dom: &dyn Dom, link: ElementRef) -> Result<MenuEntry, MenuAttribute> {
    let required = |attribute: MenuAttribute| {
        dom.attr(link, attribute.markup_name())
            .filter(|value| !value.trim().is_empty())
            .ok_or(attribute)
    };

    let href = required(MenuAttribute::Href)?;
    let template_id = required(MenuAttribute::TemplateId)?;
    let title_tag = required(MenuAttribute::TitleTag)?;
    let list_item = dom
        .closest(link, LIST_ITEM_SELECTOR)
        .ok_or(MenuAttribute::ListItem)?;

    Ok(MenuEntry {
        href,
        template_id,
        title_tag,
        link,
        list_item,
    })
}

#[cfg(test)]
#[path = "tests/menu_tests.rs"]
mod tests;
