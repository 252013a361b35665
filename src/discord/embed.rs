mod color;
mod field;

use serde::Serialize;

pub use color::Color;
pub use field::Field;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub description: String,
    pub color: Color,
    pub fields: Vec<Field>,
}

impl Embed {
    /// An embed with an empty description, in the relay's fixed color.
    #[must_use]
    pub const fn with_fields(fields: Vec<Field>) -> Self {
        Self {
            description: String::new(),
            color: Color::GREEN,
            fields,
        }
    }
}
