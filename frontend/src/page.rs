use std::cell::Cell;
use std::rc::Rc;

use log::info;

use crate::components::contact_form::ContactForm;
use crate::components::mobile_menu::MobileMenu;
use crate::components::notification::{NotificationCenter, NotificationKind, NotificationTiming};
use crate::components::scroll_effects::{self, ScrollEffects};
use crate::components::validation::{FieldValidator, ValidationResult};
use crate::config::UiConfig;
use crate::dom::{EventKind, NodeId, PresentationTree};
use crate::scheduler::Scheduler;
use crate::styles;

/// Owns every behavior wired onto one page.
///
/// Listeners registered on the tree only hold weak references, so dropping the
/// controller silences them.
pub struct PageController {
    tree: Rc<dyn PresentationTree>,
    notifications: NotificationCenter,
    validator: FieldValidator,
    contact_form: Option<ContactForm>,
    menu: Option<MobileMenu>,
    scroll: ScrollEffects,
    logo_clicks: Rc<Cell<u32>>,
}

impl PageController {
    pub fn mount(tree: Rc<dyn PresentationTree>, scheduler: Rc<dyn Scheduler>, config: UiConfig) -> Self {
        let config = Rc::new(config);
        styles::install(tree.as_ref());
        fade_in_body(&tree, scheduler.as_ref(), config.fade_in_delay_ms);

        let notifications = NotificationCenter::new(
            tree.clone(),
            scheduler.clone(),
            NotificationTiming { visible_ms: config.notification_ms, exit_ms: config.exit_transition_ms },
        );
        let validator = FieldValidator::new(tree.clone(), Rc::new(config.messages.clone()));

        scroll_effects::enable_smooth_scroll(&tree);
        let menu = MobileMenu::mount(&tree);
        let scroll = ScrollEffects::mount(tree.clone(), scheduler.clone(), config.clone());
        let contact_form = ContactForm::mount(
            tree.clone(),
            scheduler,
            notifications.clone(),
            validator.clone(),
            config.clone(),
        );
        let logo_clicks = Rc::new(Cell::new(0));
        wire_easter_egg(&tree, &notifications, &config, &logo_clicks);

        scroll.refresh();
        info!(
            "Page mounted (contact form: {}, mobile menu: {})",
            contact_form.is_some(),
            menu.is_some()
        );
        Self { tree, notifications, validator, contact_form, menu, scroll, logo_clicks }
    }

    pub fn notify(&self, message: &str, kind: NotificationKind) {
        self.notifications.notify(message, kind);
    }

    pub fn validate(&self, field: NodeId) -> ValidationResult {
        self.validator.validate(field)
    }

    pub fn set_field_error(&self, field: NodeId, message: &str) {
        self.validator.set_field_error(field, message);
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn contact_form(&self) -> Option<&ContactForm> {
        self.contact_form.as_ref()
    }

    pub fn menu_open(&self) -> bool {
        self.menu.as_ref().map_or(false, |menu| menu.is_open(self.tree.as_ref()))
    }

    pub fn scroll_top_button(&self) -> NodeId {
        self.scroll.scroll_top_button()
    }

    pub fn logo_clicks(&self) -> u32 {
        self.logo_clicks.get()
    }
}

fn fade_in_body(tree: &Rc<dyn PresentationTree>, scheduler: &dyn Scheduler, delay_ms: u32) {
    let body = tree.body();
    tree.set_style(body, "opacity", "0");
    let weak = Rc::downgrade(tree);
    scheduler.after(delay_ms, Box::new(move || {
        if let Some(tree) = weak.upgrade() {
            tree.set_style(body, "transition", "opacity 0.5s ease");
            tree.set_style(body, "opacity", "1");
        }
    }));
}

fn wire_easter_egg(
    tree: &Rc<dyn PresentationTree>,
    notifications: &NotificationCenter,
    config: &Rc<UiConfig>,
    clicks: &Rc<Cell<u32>>,
) {
    let Some(logo) = tree.query(".logo") else {
        return;
    };
    let notifications = notifications.downgrade();
    let config = config.clone();
    let clicks = Rc::downgrade(clicks);
    tree.listen(logo, EventKind::Click, Box::new(move |_| {
        let (Some(notifications), Some(clicks)) = (notifications.upgrade(), clicks.upgrade()) else {
            return;
        };
        clicks.set(clicks.get() + 1);
        if clicks.get() >= config.easter_egg_clicks {
            notifications.notify(&config.messages.easter_egg, NotificationKind::Success);
            clicks.set(0);
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;
    use crate::scheduler::ManualScheduler;

    fn landing() -> (Rc<MemoryTree>, Rc<ManualScheduler>, PageController) {
        let tree = Rc::new(MemoryTree::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let body = tree.body();
        let nav = tree.element(body, "nav", &[]);
        tree.element(nav, "div", &[("class", "logo")]);
        tree.element(nav, "button", &[("class", "mobile-menu-btn")]);
        let links = tree.element(nav, "ul", &[("class", "nav-links")]);
        tree.element(links, "a", &[("href", "#kontak")]);
        let section = tree.element(body, "section", &[("id", "kontak")]);
        let form = tree.element(section, "form", &[("id", "contactForm")]);
        let group = tree.element(form, "div", &[("class", "form-group")]);
        tree.element(group, "input", &[("id", "email"), ("type", "email"), ("required", "")]);
        tree.element(form, "button", &[("class", "submit-button")]);

        let controller = PageController::mount(tree.clone(), scheduler.clone(), UiConfig::default());
        (tree, scheduler, controller)
    }

    #[test]
    fn mount_wires_every_feature() {
        let (tree, scheduler, controller) = landing();
        assert!(controller.contact_form().is_some());
        assert_eq!(tree.query_in(tree.head(), "style").len(), 2);
        assert!(tree.is_attached(controller.scroll_top_button()));

        assert_eq!(tree.style(tree.body(), "opacity").as_deref(), Some("0"));
        scheduler.advance(100);
        assert_eq!(tree.style(tree.body(), "opacity").as_deref(), Some("1"));

        tree.click(tree.query(".mobile-menu-btn").unwrap());
        assert!(controller.menu_open());
    }

    #[test]
    fn fifth_logo_click_shows_easter_egg() {
        let (tree, _scheduler, controller) = landing();
        let logo = tree.query(".logo").unwrap();
        for _ in 0..4 {
            tree.click(logo);
        }
        assert!(controller.notifications().current().is_none());
        tree.click(logo);
        assert!(controller.notifications().current().is_some());
        assert_eq!(controller.logo_clicks(), 0);
        assert!(tree.text(tree.query(".notification").unwrap()).contains("Easter Egg"));
    }

    #[test]
    fn blur_validation_and_notify_go_through_the_controller() {
        let (tree, _scheduler, controller) = landing();
        let email = tree.by_id("email").unwrap();
        tree.set_value(email, "user @example.com");
        tree.dispatch(email, EventKind::Blur);
        assert_eq!(tree.query_all(".field-error").len(), 1);

        tree.set_value(email, "user@example.com");
        assert!(controller.validate(email).is_valid());
        controller.set_field_error(email, "Sudah terdaftar");
        assert_eq!(tree.text(tree.next_sibling(email).unwrap()), "Sudah terdaftar");

        controller.notify("Halo", NotificationKind::Warning);
        controller.notify("Halo lagi", NotificationKind::Success);
        assert_eq!(tree.query_all(".notification").len(), 1);
    }

    #[test]
    fn dropping_the_controller_silences_listeners() {
        let (tree, _scheduler, controller) = landing();
        drop(controller);
        tree.scroll_window(500.0);
        let logo = tree.query(".logo").unwrap();
        for _ in 0..5 {
            tree.click(logo);
        }
        assert!(tree.query(".notification").is_none());

        let email = tree.by_id("email").unwrap();
        tree.dispatch(email, EventKind::Blur);
        tree.type_value(email, "user @example.com");
        assert!(tree.query(".field-error").is_none());

        let form = tree.by_id("contactForm").unwrap();
        assert!(tree.dispatch(form, EventKind::Submit));
        assert!(tree.query(".notification").is_none());
    }
}
