use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::config::Messages;
use crate::dom::{build, EventKind, NodeId, PresentationTree};

pub const INVALID_CLASS: &str = "invalid";
pub const ERROR_CLASS: &str = "field-error";
const ERROR_COLOR: &str = "#FF6B35";

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
/// Indonesian numbers: +62, 62 or a leading 0, then 9 to 12 digits.
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+62|62|0)[0-9]{9,12}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("this field is required")]
    Required,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid phone number")]
    InvalidPhone,
}

impl FieldError {
    pub fn message(self, messages: &Messages) -> &str {
        match self {
            FieldError::Required => &messages.required,
            FieldError::InvalidEmail => &messages.invalid_email,
            FieldError::InvalidPhone => &messages.invalid_phone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Tel,
    Other,
}

impl FieldKind {
    pub fn from_type_attribute(kind: Option<&str>) -> Self {
        match kind.map(|kind| kind.trim().to_ascii_lowercase()).as_deref() {
            Some("email") => FieldKind::Email,
            Some("tel") => FieldKind::Tel,
            _ => FieldKind::Other,
        }
    }
}

/// Runs the rule set on a raw control value. Only the first failing rule is reported.
pub fn check(kind: FieldKind, required: bool, raw: &str) -> Result<(), FieldError> {
    let value = raw.trim();
    if value.is_empty() {
        return if required { Err(FieldError::Required) } else { Ok(()) };
    }
    match kind {
        FieldKind::Email if !EMAIL.is_match(value) => Err(FieldError::InvalidEmail),
        FieldKind::Tel => {
            let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            if PHONE.is_match(&compact) {
                Ok(())
            } else {
                Err(FieldError::InvalidPhone)
            }
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    field: NodeId,
    error: Option<String>,
}

impl ValidationResult {
    pub fn field(&self) -> NodeId {
        self.field
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Checks form controls and renders the inline error annotation.
#[derive(Clone)]
pub struct FieldValidator {
    tree: Rc<dyn PresentationTree>,
    messages: Rc<Messages>,
}

impl FieldValidator {
    pub fn new(tree: Rc<dyn PresentationTree>, messages: Rc<Messages>) -> Self {
        Self { tree, messages }
    }

    /// Validates `field` and refreshes its error display. Never fails.
    pub fn validate(&self, field: NodeId) -> ValidationResult {
        let tree = self.tree.as_ref();
        let kind = FieldKind::from_type_attribute(tree.attribute(field, "type").as_deref());
        let required = tree.has_attribute(field, "required");
        let error = check(kind, required, &tree.value(field))
            .err()
            .map(|error| error.message(&self.messages).to_string());

        self.clear_field_error(field);
        if let Some(message) = &error {
            self.set_field_error(field, message);
        }
        ValidationResult { field, error }
    }

    /// Validates every field (no short-circuit, so all errors show). True when all pass.
    pub fn validate_all(&self, fields: &[NodeId]) -> bool {
        fields.iter().fold(true, |all_valid, field| self.validate(*field).is_valid() && all_valid)
    }

    /// Marks `field` invalid and places one annotation right after it.
    pub fn set_field_error(&self, field: NodeId, message: &str) {
        let tree = self.tree.as_ref();
        self.clear_field_error(field);
        tree.add_class(field, INVALID_CLASS);
        tree.set_style(field, "border-color", ERROR_COLOR);

        let annotation = build(tree, "div", ERROR_CLASS, Some(message));
        tree.set_styles(annotation, &[
            ("color", ERROR_COLOR),
            ("font-size", "0.85rem"),
            ("margin-top", "0.3rem"),
            ("animation", "fadeInUp 0.3s ease"),
        ]);
        tree.insert_after(field, annotation);
    }

    pub fn clear_field_error(&self, field: NodeId) {
        let tree = self.tree.as_ref();
        tree.remove_class(field, INVALID_CLASS);
        tree.set_style(field, "border-color", "");
        while let Some(annotation) = tree.next_sibling(field).filter(|next| tree.has_class(*next, ERROR_CLASS)) {
            tree.remove(annotation);
        }
    }

    /// Validates on blur, and on every edit while the field is flagged invalid.
    ///
    /// The listeners stop once every clone of this validator is dropped.
    pub fn attach(&self, field: NodeId) {
        let tree = Rc::downgrade(&self.tree);
        let messages = Rc::downgrade(&self.messages);
        self.tree.listen(field, EventKind::Blur, Box::new(move |_| {
            if let (Some(tree), Some(messages)) = (tree.upgrade(), messages.upgrade()) {
                FieldValidator::new(tree, messages).validate(field);
            }
        }));

        let tree = Rc::downgrade(&self.tree);
        let messages = Rc::downgrade(&self.messages);
        self.tree.listen(field, EventKind::Input, Box::new(move |_| {
            if let (Some(tree), Some(messages)) = (tree.upgrade(), messages.upgrade()) {
                if tree.has_class(field, INVALID_CLASS) {
                    FieldValidator::new(tree, messages).validate(field);
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;

    fn setup() -> (Rc<MemoryTree>, FieldValidator, NodeId) {
        let tree = Rc::new(MemoryTree::new());
        let group = tree.element(tree.body(), "div", &[("class", "form-group")]);
        let validator = FieldValidator::new(tree.clone(), Rc::new(Messages::default()));
        (tree, validator, group)
    }

    fn annotations(tree: &MemoryTree) -> usize {
        tree.query_all(".field-error").len()
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let (tree, validator, group) = setup();
        let name = tree.element(group, "input", &[("type", "text"), ("required", "")]);
        tree.set_value(name, "   ");

        let result = validator.validate(name);
        assert!(!result.is_valid());
        assert_eq!(result.field(), name);
        assert_eq!(result.error_message(), Some(Messages::default().required.as_str()));
        assert!(tree.has_class(name, INVALID_CLASS));
        assert_eq!(tree.style(name, "border-color").as_deref(), Some(ERROR_COLOR));
        let annotation = tree.next_sibling(name).unwrap();
        assert_eq!(tree.text(annotation), "Field ini wajib diisi");
    }

    #[test]
    fn optional_empty_field_is_valid() {
        assert_eq!(check(FieldKind::Email, false, ""), Ok(()));
        assert_eq!(check(FieldKind::Tel, false, "  "), Ok(()));
    }

    #[test]
    fn email_shape() {
        assert_eq!(check(FieldKind::Email, true, "user@example.com"), Ok(()));
        assert_eq!(check(FieldKind::Email, true, " user@example.com "), Ok(()));
        assert_eq!(check(FieldKind::Email, true, "user@example"), Err(FieldError::InvalidEmail));
        assert_eq!(check(FieldKind::Email, true, "user @example.com"), Err(FieldError::InvalidEmail));
        assert_eq!(check(FieldKind::Email, true, ""), Err(FieldError::Required));
    }

    #[test]
    fn phone_shape() {
        assert_eq!(check(FieldKind::Tel, false, "081234567890"), Ok(()));
        assert_eq!(check(FieldKind::Tel, false, "+6281234567890"), Ok(()));
        assert_eq!(check(FieldKind::Tel, false, "0812 3456 7890"), Ok(()));
        assert_eq!(check(FieldKind::Tel, false, "12345"), Err(FieldError::InvalidPhone));
        assert_eq!(check(FieldKind::Tel, false, "0812345678901234"), Err(FieldError::InvalidPhone));
    }

    #[test]
    fn type_attribute_selects_rules() {
        let (tree, validator, group) = setup();
        let email = tree.element(group, "input", &[("type", "email")]);
        tree.set_value(email, "user@example");
        assert_eq!(validator.validate(email).error_message(), Some("Format email tidak valid"));

        let phone = tree.element(group, "input", &[("type", "tel")]);
        tree.set_value(phone, "12345");
        assert_eq!(validator.validate(phone).error_message(), Some("Format nomor telepon tidak valid"));

        let text = tree.element(group, "input", &[("type", "text")]);
        tree.set_value(text, "12345");
        assert!(validator.validate(text).is_valid());
    }

    #[test]
    fn revalidating_keeps_a_single_annotation() {
        let (tree, validator, group) = setup();
        let email = tree.element(group, "input", &[("type", "email"), ("required", "")]);
        tree.set_value(email, "nope");

        let first = validator.validate(email);
        let second = validator.validate(email);
        assert_eq!(first, second);
        assert_eq!(annotations(&tree), 1);

        tree.set_value(email, "user@example.com");
        assert!(validator.validate(email).is_valid());
        assert_eq!(annotations(&tree), 0);
        assert!(!tree.has_class(email, INVALID_CLASS));
        assert_eq!(tree.style(email, "border-color"), None);
    }

    #[test]
    fn input_events_only_revalidate_flagged_fields() {
        let (tree, validator, group) = setup();
        let email = tree.element(group, "input", &[("type", "email"), ("required", "")]);
        validator.attach(email);

        // Typing into a clean field does not interrupt the user.
        tree.type_value(email, "us");
        assert_eq!(annotations(&tree), 0);

        tree.dispatch(email, EventKind::Blur);
        assert_eq!(annotations(&tree), 1);

        tree.type_value(email, "user@example.co");
        assert_eq!(annotations(&tree), 0);
        assert!(!tree.has_class(email, INVALID_CLASS));

        // Once valid again, edits go back to blur-only checking.
        tree.type_value(email, "user@");
        assert_eq!(annotations(&tree), 0);
    }

    #[test]
    fn dropped_validator_stops_listening() {
        let (tree, validator, group) = setup();
        let email = tree.element(group, "input", &[("type", "email"), ("required", "")]);
        validator.attach(email);
        drop(validator);

        tree.dispatch(email, EventKind::Blur);
        tree.type_value(email, "nope");
        assert_eq!(annotations(&tree), 0);
    }

    #[test]
    fn validate_all_reports_every_field() {
        let (tree, validator, group) = setup();
        let name = tree.element(group, "input", &[("required", "")]);
        let email = tree.element(group, "input", &[("type", "email"), ("required", "")]);
        tree.set_value(email, "bad");
        assert!(!validator.validate_all(&[name, email]));
        assert_eq!(annotations(&tree), 2);
    }
}
