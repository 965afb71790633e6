use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(ElementRef);
id_newtype!(NavSequence);

impl NavSequence {
    pub const ZERO: NavSequence = NavSequence(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One navigable menu link, read from markup once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub href: String,
    pub template_id: String,
    pub title_tag: String,
    pub link: ElementRef,
    pub list_item: ElementRef,
}

impl MenuEntry {
    /// Literal trailing match: `/a` matches `/foo/a` but not `/a/b`.
    pub fn matches(&self, url: &str) -> bool {
        url.ends_with(self.href.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAttribute {
    Href,
    TemplateId,
    TitleTag,
    ListItem,
}

impl MenuAttribute {
    pub fn markup_name(self) -> &'static str {
        match self {
            MenuAttribute::Href => "href",
            MenuAttribute::TemplateId => "data-template-id",
            MenuAttribute::TitleTag => "data-title-tag",
            MenuAttribute::ListItem => "li",
        }
    }
}

/// A menu link that was excluded from the entry set at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub link: ElementRef,
    pub position: usize,
    pub missing: MenuAttribute,
}
