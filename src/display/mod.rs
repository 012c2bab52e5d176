//! Presentation helpers for the dashboard pages
//!
//! Handles:
//! - Relative-time phrases ("3 hours ago", "in 2 days")
//! - Materialize CSS color classes keyed by age or by identifier
//! - Severity-tagged HTML message fragments

pub mod duration;
pub mod message;
pub mod palette;

pub use duration::{duration_color, format_relative, RelativeMode};
pub use message::{format_message, render_message, MessageError, Severity};
pub use palette::{palette_color, PaletteKind};
