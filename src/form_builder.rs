//! Booking Form Builder
//!
//! State transitions for the admin form builder. The state is the
//! `BookingConfig` itself, so whatever the builder produces is what gets
//! stored on the service.

use crate::models::{BookingConfig, DocumentRequirement, FieldType, FormField};

/// Field type options offered by the builder (tag, label)
pub const FIELD_TYPES: &[(&str, &str)] = &[
    ("text", "Short text"),
    ("textarea", "Long text"),
    ("number", "Number"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("date", "Date"),
    ("select", "Dropdown"),
    ("checkbox", "Checkbox"),
];

/// Parse a type tag from the builder's type selector; unknown tags become text
pub fn field_type_from_tag(tag: &str) -> FieldType {
    match tag {
        "textarea" => FieldType::Textarea,
        "number" => FieldType::Number { min: None, max: None },
        "email" => FieldType::Email,
        "phone" => FieldType::Phone,
        "date" => FieldType::Date,
        "select" => FieldType::Select { options: Vec::new() },
        "checkbox" => FieldType::Checkbox,
        _ => FieldType::Text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Label(String),
    Kind(FieldType),
    Required(bool),
    Placeholder(Option<String>),
    /// Replace the options of a select field; ignored for other kinds
    Options(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEdit {
    Name(String),
    Description(Option<String>),
    Required(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    AddField { label: String, field_type: FieldType },
    UpdateField { id: String, edit: FieldEdit },
    RemoveField { id: String },
    MoveField { id: String, direction: Direction },
    AddDocument { name: String, required: bool },
    UpdateDocument { id: String, edit: DocumentEdit },
    RemoveDocument { id: String },
    /// Load a stored config, e.g. when opening a service for editing
    Reset(BookingConfig),
}

/// Smallest `{prefix}_{n}` (n >= 1) not already taken
fn next_id<'a>(prefix: &str, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    (1..)
        .map(|n| format!("{}_{}", prefix, n))
        .find(|candidate| !taken.clone().any(|t| t == candidate))
        .unwrap_or_else(|| prefix.to_string())
}

fn apply_field_edit(field: &mut FormField, edit: FieldEdit) {
    match edit {
        FieldEdit::Label(label) => field.label = label,
        FieldEdit::Kind(kind) => {
            // Switching between select variants keeps the typed options
            let keep = match (&field.field_type, &kind) {
                (FieldType::Select { options }, FieldType::Select { options: new })
                    if new.is_empty() =>
                {
                    Some(options.clone())
                }
                _ => None,
            };
            field.field_type = match keep {
                Some(options) => FieldType::Select { options },
                None => kind,
            };
        }
        FieldEdit::Required(required) => field.required = required,
        FieldEdit::Placeholder(placeholder) => field.placeholder = placeholder,
        FieldEdit::Options(new_options) => {
            if let FieldType::Select { options } = &mut field.field_type {
                *options = new_options;
            }
        }
    }
}

fn apply_document_edit(document: &mut DocumentRequirement, edit: DocumentEdit) {
    match edit {
        DocumentEdit::Name(name) => document.name = name,
        DocumentEdit::Description(description) => document.description = description,
        DocumentEdit::Required(required) => document.required = required,
    }
}

/// Apply one builder action. Actions naming an unknown id change nothing.
pub fn reduce(mut config: BookingConfig, action: FormAction) -> BookingConfig {
    match action {
        FormAction::AddField { label, field_type } => {
            let id = next_id("field", config.fields.iter().map(|f| f.id.as_str()));
            config.fields.push(FormField::new(id, label, field_type));
        }
        FormAction::UpdateField { id, edit } => {
            if let Some(field) = config.fields.iter_mut().find(|f| f.id == id) {
                apply_field_edit(field, edit);
            }
        }
        FormAction::RemoveField { id } => {
            config.fields.retain(|f| f.id != id);
        }
        FormAction::MoveField { id, direction } => {
            if let Some(pos) = config.fields.iter().position(|f| f.id == id) {
                match direction {
                    Direction::Up if pos > 0 => config.fields.swap(pos, pos - 1),
                    Direction::Down if pos + 1 < config.fields.len() => {
                        config.fields.swap(pos, pos + 1)
                    }
                    _ => {}
                }
            }
        }
        FormAction::AddDocument { name, required } => {
            let id = next_id("doc", config.documents.iter().map(|d| d.id.as_str()));
            config.documents.push(DocumentRequirement {
                id,
                name,
                description: None,
                required,
            });
        }
        FormAction::UpdateDocument { id, edit } => {
            if let Some(document) = config.documents.iter_mut().find(|d| d.id == id) {
                apply_document_edit(document, edit);
            }
        }
        FormAction::RemoveDocument { id } => {
            config.documents.retain(|d| d.id != id);
        }
        FormAction::Reset(stored) => config = stored,
    }
    config
}
