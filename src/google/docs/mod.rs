//! Google Docs access and template filling

pub mod client;
pub mod template;
pub mod types;

pub use client::{DocsClient, DocumentService};
pub use types::{Document, Range, Request};
