use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::info;
use serde::Serialize;

use crate::components::notification::{NotificationCenter, NotificationKind};
use crate::components::validation::FieldValidator;
use crate::config::UiConfig;
use crate::dom::{EventKind, NodeId, PresentationTree};
use crate::scheduler::{Scheduler, TaskHandle};

pub const FORM_ID: &str = "contactForm";
pub const FIELD_SELECTOR: &str = ".form-group input, .form-group textarea, .form-group select";

/// What the visitor entered. Only logged: there is no backend to send it to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

struct Inner {
    tree: Rc<dyn PresentationTree>,
    scheduler: Rc<dyn Scheduler>,
    notifications: NotificationCenter,
    validator: FieldValidator,
    config: Rc<UiConfig>,
    form: NodeId,
    fields: Vec<NodeId>,
    submit_button: Option<NodeId>,
    pending: Cell<Option<TaskHandle>>,
    last_submission: RefCell<Option<ContactSubmission>>,
}

impl Inner {
    fn field_value(&self, id: &str) -> String {
        self.tree.by_id(id).map(|node| self.tree.value(node)).unwrap_or_default()
    }

    fn collect(&self) -> ContactSubmission {
        ContactSubmission {
            name: self.field_value("name"),
            email: self.field_value("email"),
            phone: self.field_value("phone"),
            subject: self.field_value("subject"),
            message: self.field_value("message"),
        }
    }

    fn submit(self: &Rc<Self>) {
        if self.pending.get().is_some() {
            info!("Ignoring repeated submit while sending");
            return;
        }
        if !self.validator.validate_all(&self.fields) {
            self.notifications.notify(&self.config.messages.form_invalid, NotificationKind::Warning);
            return;
        }

        let submission = self.collect();
        let original_label = self.submit_button.map(|button| {
            let label = self.tree.text(button);
            self.tree.set_text(button, &self.config.messages.sending);
            self.tree.set_attribute(button, "disabled", "");
            label
        });

        let weak = Rc::downgrade(self);
        let handle = self.scheduler.after(
            self.config.submit_delay_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.finish(submission, original_label);
                }
            }),
        );
        self.pending.set(Some(handle));
    }

    fn finish(&self, submission: ContactSubmission, original_label: Option<String>) {
        self.pending.set(None);
        self.notifications.notify(&self.config.messages.form_sent, NotificationKind::Success);
        for field in &self.fields {
            self.tree.set_value(*field, "");
        }
        if let (Some(button), Some(label)) = (self.submit_button, original_label) {
            self.tree.set_text(button, &label);
            self.tree.remove_attribute(button, "disabled");
        }
        match serde_json::to_string(&submission) {
            Ok(json) => info!("Form submitted: {}", json),
            Err(e) => info!("Form submitted (unserializable: {})", e),
        }
        *self.last_submission.borrow_mut() = Some(submission);
    }
}

/// Contact form with a simulated, fixed-delay submission.
#[derive(Clone)]
pub struct ContactForm {
    inner: Rc<Inner>,
}

impl ContactForm {
    /// Wires the form if the page has one.
    pub fn mount(
        tree: Rc<dyn PresentationTree>,
        scheduler: Rc<dyn Scheduler>,
        notifications: NotificationCenter,
        validator: FieldValidator,
        config: Rc<UiConfig>,
    ) -> Option<Self> {
        let form = tree.by_id(FORM_ID)?;
        let fields = tree.query_in(form, FIELD_SELECTOR);
        for field in &fields {
            validator.attach(*field);
        }
        let submit_button = tree.query_in(form, ".submit-button").into_iter().next();

        let inner = Rc::new(Inner {
            tree: tree.clone(),
            scheduler,
            notifications,
            validator,
            config,
            form,
            fields,
            submit_button,
            pending: Cell::new(None),
            last_submission: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        tree.listen(form, EventKind::Submit, Box::new(move |event| {
            event.prevent_default();
            if let Some(inner) = weak.upgrade() {
                inner.submit();
            }
        }));
        info!("Contact form ready ({} fields)", inner.fields.len());
        Some(Self { inner })
    }

    pub fn submit(&self) {
        self.inner.submit();
    }

    pub fn is_sending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    pub fn form(&self) -> NodeId {
        self.inner.form
    }

    /// The most recent completed submission.
    pub fn last_submission(&self) -> Option<ContactSubmission> {
        self.inner.last_submission.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::notification::NotificationTiming;
    use crate::dom::MemoryTree;
    use crate::scheduler::ManualScheduler;

    struct Fixture {
        tree: Rc<MemoryTree>,
        scheduler: Rc<ManualScheduler>,
        form: ContactForm,
        button: NodeId,
    }

    fn field(tree: &MemoryTree, form: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let group = tree.element(form, "div", &[("class", "form-group")]);
        tree.element(group, tag, attributes)
    }

    fn fixture() -> Fixture {
        let tree = Rc::new(MemoryTree::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let form = tree.element(tree.body(), "form", &[("id", FORM_ID)]);
        field(&tree, form, "input", &[("id", "name"), ("type", "text"), ("required", "")]);
        field(&tree, form, "input", &[("id", "email"), ("type", "email"), ("required", "")]);
        field(&tree, form, "input", &[("id", "phone"), ("type", "tel")]);
        field(&tree, form, "select", &[("id", "subject")]);
        field(&tree, form, "textarea", &[("id", "message"), ("required", "")]);
        let button = tree.element(form, "button", &[("class", "submit-button"), ("type", "submit")]);
        tree.set_text(button, "Kirim Pesan");

        let config = Rc::new(UiConfig::default());
        let notifications = NotificationCenter::new(tree.clone(), scheduler.clone(), NotificationTiming::default());
        let validator = FieldValidator::new(tree.clone(), Rc::new(config.messages.clone()));
        let form = ContactForm::mount(tree.clone(), scheduler.clone(), notifications, validator, config).unwrap();
        Fixture { tree, scheduler, form, button }
    }

    fn fill(tree: &MemoryTree) {
        for (id, value) in [
            ("name", "Sari"),
            ("email", "sari@example.com"),
            ("phone", "0812 3456 7890"),
            ("subject", "demo"),
            ("message", "Halo"),
        ] {
            tree.set_value(tree.by_id(id).unwrap(), value);
        }
    }

    fn notification_text(tree: &MemoryTree) -> Option<String> {
        tree.query(".notification-message").map(|node| tree.text(node))
    }

    #[test]
    fn missing_form_is_skipped() {
        let tree = Rc::new(MemoryTree::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let config = Rc::new(UiConfig::default());
        let notifications = NotificationCenter::new(tree.clone(), scheduler.clone(), NotificationTiming::default());
        let validator = FieldValidator::new(tree.clone(), Rc::new(config.messages.clone()));
        assert!(ContactForm::mount(tree, scheduler, notifications, validator, config).is_none());
    }

    #[test]
    fn valid_submission_completes_after_delay() {
        let Fixture { tree, scheduler, form, button } = fixture();
        fill(&tree);

        assert!(tree.dispatch(form.form(), EventKind::Submit));
        assert!(form.is_sending());
        assert_eq!(tree.text(button), "Mengirim...");
        assert!(tree.has_attribute(button, "disabled"));
        assert_eq!(notification_text(&tree), None);

        scheduler.advance(1_499);
        assert!(form.is_sending());
        scheduler.advance(1);

        assert!(!form.is_sending());
        assert_eq!(notification_text(&tree), Some(UiConfig::default().messages.form_sent));
        assert_eq!(tree.text(button), "Kirim Pesan");
        assert!(!tree.has_attribute(button, "disabled"));
        assert_eq!(tree.value(tree.by_id("email").unwrap()), "");
        let sent = form.last_submission().unwrap();
        assert_eq!(sent.name, "Sari");
        assert_eq!(sent.phone, "0812 3456 7890");
    }

    #[test]
    fn repeated_submit_is_ignored_while_sending() {
        let Fixture { tree, scheduler, form, .. } = fixture();
        fill(&tree);
        form.submit();
        form.submit();
        assert_eq!(scheduler.pending(), 1);
        scheduler.advance(1_500);
        assert!(form.last_submission().is_some());
    }

    #[test]
    fn invalid_fields_block_submission_with_warning() {
        let Fixture { tree, scheduler, form, button } = fixture();
        fill(&tree);
        tree.set_value(tree.by_id("phone").unwrap(), "12345");

        form.submit();
        assert!(!form.is_sending());
        assert_eq!(tree.text(button), "Kirim Pesan");
        let banner = tree.query(".notification").unwrap();
        assert!(tree.has_class(banner, "warning"));
        assert_eq!(tree.query_all(".field-error").len(), 1);

        scheduler.advance(10_000);
        assert!(form.last_submission().is_none());
    }
}
