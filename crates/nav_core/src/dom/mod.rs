//! DOM implementations usable without a browser.

mod memory;

pub use memory::{DomOp, MemoryDom};
