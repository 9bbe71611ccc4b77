/// Editable caption field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionField {
    Title,
    Description,
}

/// Title and description of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionRecord {
    pub title: String,
    pub description: String,
}

impl CaptionRecord {
    /// Create a record with both fields trimmed.
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        }
    }

    /// Copy with surrounding whitespace removed from both fields.
    pub fn trimmed(&self) -> Self {
        Self::new(&self.title, &self.description)
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }

    pub fn set(&mut self, field: CaptionField, value: impl Into<String>) {
        match field {
            CaptionField::Title => self.title = value.into(),
            CaptionField::Description => self.description = value.into(),
        }
    }
}
