//! Form schema: the editable-field contract of a resource.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    Select,
    Toggle,
}

/// Flavour of a text input; drives both the input affordance and validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Tel,
    Numeric,
}

/// One value of a closed choice set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub widget: Widget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Layout only.
    pub column_span_full: bool,
    /// Layout only.
    pub inline: bool,
}

impl FormField {
    fn base(name: &str, label: &str, widget: Widget) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            widget,
            input_type: None,
            required: false,
            max_length: None,
            options: vec![],
            column_span_full: false,
            inline: true,
        }
    }

    #[must_use]
    pub fn text(name: &str, label: &str) -> Self {
        let mut f = Self::base(name, label, Widget::TextInput);
        f.input_type = Some(InputType::Text);
        f
    }

    #[must_use]
    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        let mut f = Self::base(name, label, Widget::Select);
        f.options = options;
        f
    }

    #[must_use]
    pub fn toggle(name: &str, label: &str) -> Self {
        Self::base(name, label, Widget::Toggle)
    }

    #[must_use]
    pub fn email(mut self) -> Self {
        self.input_type = Some(InputType::Email);
        self
    }

    #[must_use]
    pub fn tel(mut self) -> Self {
        self.input_type = Some(InputType::Tel);
        self
    }

    #[must_use]
    pub fn numeric(mut self) -> Self {
        self.input_type = Some(InputType::Numeric);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    #[must_use]
    pub const fn column_span_full(mut self) -> Self {
        self.column_span_full = true;
        self
    }

    #[must_use]
    pub const fn inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    #[must_use]
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
