//! PDF rendering of aggregate reports.
//!
//! Reports are rendered on demand from the stored JSON, never persisted:
//! a report document is a projection of the aggregate, not part of it.
//!
//! Section payloads are read defensively -- a scanner that changed its
//! output shape, or a section carrying a failure marker, degrades that
//! one section to a placeholder while the rest of the document renders
//! normally.
//!
//! Layout state lives in an explicit [`Cursor`] that owns the current
//! page and vertical position; every drawing helper advances it, and
//! page breaks happen in exactly one place.

pub mod layout;
pub mod render;
pub mod theme;

pub use render::render_report;
