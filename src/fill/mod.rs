//! Form field filling.
//!
//! Fields are identified by fully qualified name. Each answer is rendered
//! with [`Rendering::Field`](crate::model::Rendering::Field) and written into
//! the field best-effort: a field that cannot take its value is reported in
//! the [`FillReport`] and skipped.

mod fields;
mod filler;

pub use fields::{
    current_value, on_states, FieldInfo, FieldKind, FormField, FormFields, FLAG_PUSHBUTTON,
    FLAG_RADIO,
};
pub use filler::{apply_value, fill_fields, FillReport};
