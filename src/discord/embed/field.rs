use serde::Serialize;

/// A single name/value row of an embed.
///
/// The name is always upper-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    name: String,
    value: String,
}

impl Field {
    #[must_use]
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_uppercase(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_upper_cased() {
        let field = Field::new("data.attributes.from", "A");
        assert_eq!(field.name(), "DATA.ATTRIBUTES.FROM");
        assert_eq!(field.value(), "A");
    }

    #[test]
    fn serializes_name_and_value_only() {
        let json = serde_json::to_string(&Field::new("id", "1")).unwrap();
        assert_eq!(json, r#"{"name":"ID","value":"1"}"#);
    }
}
