//! Booking Configuration
//!
//! Admin-defined booking form attached to a service: the input fields a
//! citizen fills in and the supporting documents they must upload.

use serde::{Deserialize, Serialize};

/// The type of a form field, determines what shape the submitted value takes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Email,
    Phone,
    /// Calendar date, submitted as `YYYY-MM-DD`
    Date,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Checkbox,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number { .. } => "number",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::Select { .. } => "select",
            FieldType::Checkbox => "checkbox",
        }
    }
}

/// A single input on the booking form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Key under which the submitted value is stored
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FormField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A supporting document the citizen uploads with a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequirement {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Form fields plus document requirements for one service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub documents: Vec<DocumentRequirement>,
}

impl BookingConfig {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.documents.is_empty()
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }
}
