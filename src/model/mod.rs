//! Data model for export requests.
//!
//! Answers are kept as JSON values so callers can hand over the submitted
//! form document as-is; rendering to text happens at the point of use.

mod answers;
mod request;

pub use answers::{render_value, AnswerSet, Rendering};
pub use request::{ExportLocation, ExportRequest};
