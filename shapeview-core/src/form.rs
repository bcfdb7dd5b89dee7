/// Shape creation form state and validation
use crate::shape::{clamp_name, ShapeDraft, ShapeKind, NAME_MAX_CHARS};

pub const NAME_REQUIRED: &str = "Name is required";
pub const TYPE_REQUIRED: &str = "Shape type is required";

/// Input fields of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Kind,
}

/// One optional message per invalid field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub name: Option<&'static str>,
    pub kind: Option<&'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeForm {
    open: bool,
    name: String,
    kind: Option<ShapeKind>,
    errors: FormErrors,
    focus: Option<Field>,
    focus_pending: bool,
}

impl ShapeForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open blank. Focus lands on the name field on the next `settle`, once
    /// the dialog has been drawn.
    pub fn open(&mut self) {
        self.reset();
        self.open = true;
        self.focus_pending = true;
    }

    /// Apply deferred work after the dialog has been mounted
    pub fn settle(&mut self) {
        if self.open && self.focus_pending {
            self.focus = Some(Field::Name);
            self.focus_pending = false;
        }
    }

    /// Discard all input and close
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<ShapeKind> {
        self.kind
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn focus(&self) -> Option<Field> {
        self.focus
    }

    pub fn set_focus(&mut self, field: Field) {
        self.focus = Some(field);
        self.focus_pending = false;
    }

    pub fn focus_next(&mut self) {
        let next = match self.focus {
            Some(Field::Name) => Field::Kind,
            _ => Field::Name,
        };
        self.set_focus(next);
    }

    /// Replace the name; anything beyond 16 characters is dropped
    pub fn set_name(&mut self, value: &str) {
        self.name = clamp_name(value);
    }

    pub fn push_char(&mut self, c: char) {
        if self.name.chars().count() < NAME_MAX_CHARS {
            self.name.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.name.pop();
    }

    pub fn select_kind(&mut self, kind: Option<ShapeKind>) {
        self.kind = kind;
    }

    /// Step through the kind options; `None` selects the first
    pub fn cycle_kind(&mut self, forward: bool) {
        let all = ShapeKind::ALL;
        let next = match self.kind.and_then(|k| all.iter().position(|&x| x == k)) {
            None => 0,
            Some(i) if forward => (i + 1) % all.len(),
            Some(i) => (i + all.len() - 1) % all.len(),
        };
        self.kind = Some(all[next]);
    }

    /// Helper line under the name field
    pub fn name_hint(&self) -> String {
        match self.errors.name {
            Some(message) => message.to_string(),
            None => format!("{}/{} characters", self.name.chars().count(), NAME_MAX_CHARS),
        }
    }

    /// Validate both fields. On success the form resets and closes and the
    /// draft is returned for the catalog; on failure the field errors are
    /// kept for display and nothing is returned.
    pub fn submit(&mut self) -> Result<ShapeDraft, FormErrors> {
        let errors = FormErrors {
            name: self.name.trim().is_empty().then_some(NAME_REQUIRED),
            kind: self.kind.is_none().then_some(TYPE_REQUIRED),
        };

        match self.kind {
            Some(kind) if errors.is_empty() => {
                let draft = ShapeDraft {
                    name: self.name.clone(),
                    kind,
                };
                self.reset();
                Ok(draft)
            }
            _ => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}
