//! String definitions (`@String` macros).

use serde::{Deserialize, Serialize};

/// Category of a string definition.
///
/// Categories are written as contiguous blocks in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroCategory {
    /// Author names, e.g. `aKnuth`.
    Author,
    /// Institutions, e.g. `iMIT`.
    Institution,
    /// Publishers, e.g. `pACM`.
    Publisher,
    /// Everything else.
    Other,
}

impl MacroCategory {
    /// All categories in emission order.
    pub const ALL: [Self; 4] = [Self::Author, Self::Institution, Self::Publisher, Self::Other];

    /// Derives the category from the naming convention.
    ///
    /// A lowercase-insensitive `a`, `i` or `p` followed by an uppercase
    /// letter selects Author, Institution or Publisher.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
            return Self::Other;
        };
        if !second.is_uppercase() {
            return Self::Other;
        }
        match first.to_ascii_lowercase() {
            'a' => Self::Author,
            'i' => Self::Institution,
            'p' => Self::Publisher,
            _ => Self::Other,
        }
    }
}

/// A named, reusable text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMacro {
    name: String,
    content: String,
    category: MacroCategory,
    #[serde(default)]
    changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parsed_serialization: Option<String>,
}

impl StringMacro {
    /// Creates a changed string definition, deriving the category from the name.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let category = MacroCategory::from_name(&name);
        Self {
            name,
            content: content.into(),
            category,
            changed: true,
            parsed_serialization: None,
        }
    }

    /// Overrides the category.
    #[must_use]
    pub fn with_category(mut self, category: MacroCategory) -> Self {
        self.category = category;
        self
    }

    /// Marks the definition as loaded from `text` and unchanged since.
    #[must_use]
    pub fn with_parsed_serialization(mut self, text: impl Into<String>) -> Self {
        self.parsed_serialization = Some(text.into());
        self.changed = false;
        self
    }

    /// Returns the macro name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw content, possibly containing `#name#` references.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> MacroCategory {
        self.category
    }

    /// Returns true if the definition changed since it was loaded.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Replaces the content and marks the definition changed.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.changed = true;
    }

    /// Returns the text this definition was loaded from.
    #[must_use]
    pub fn parsed_serialization(&self) -> Option<&str> {
        self.parsed_serialization.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_name() {
        assert_eq!(MacroCategory::from_name("aKnuth"), MacroCategory::Author);
        assert_eq!(MacroCategory::from_name("AKnuth"), MacroCategory::Author);
        assert_eq!(MacroCategory::from_name("iMIT"), MacroCategory::Institution);
        assert_eq!(MacroCategory::from_name("pACM"), MacroCategory::Publisher);
        assert_eq!(MacroCategory::from_name("acm"), MacroCategory::Other);
        assert_eq!(MacroCategory::from_name("jan"), MacroCategory::Other);
        assert_eq!(MacroCategory::from_name("a"), MacroCategory::Other);
        assert_eq!(MacroCategory::from_name(""), MacroCategory::Other);
    }

    #[test]
    fn categories_are_ordered() {
        let mut sorted = MacroCategory::ALL;
        sorted.sort();
        assert_eq!(sorted, MacroCategory::ALL);
    }

    #[test]
    fn set_content_marks_changed() {
        let mut m = StringMacro::new("acm", "ACM").with_parsed_serialization("@String{acm = {ACM}}");
        assert!(!m.has_changed());
        m.set_content("Association for Computing Machinery");
        assert!(m.has_changed());
    }
}
