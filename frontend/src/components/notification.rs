use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use crate::dom::{build, EventKind, NodeId, PresentationTree};
use crate::scheduler::{Scheduler, TaskHandle};

/// Class shared by every banner; also used to sweep strays.
pub const BANNER_CLASS: &str = "notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
}

impl NotificationKind {
    pub fn class(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            NotificationKind::Success => "#4A9B4E",
            NotificationKind::Warning => "#FF6B35",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            NotificationKind::Success => "✓",
            NotificationKind::Warning => "⚠",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NotificationTiming {
    pub visible_ms: u32,
    pub exit_ms: u32,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self { visible_ms: 5_000, exit_ms: 300 }
    }
}

struct Banner {
    node: NodeId,
    timers: Vec<TaskHandle>,
}

struct Inner {
    tree: Rc<dyn PresentationTree>,
    scheduler: Rc<dyn Scheduler>,
    timing: NotificationTiming,
    current: RefCell<Option<Banner>>,
}

impl Inner {
    /// Removes the current banner without a transition and cancels its timers.
    fn retire(&self) {
        let retired = self.current.borrow_mut().take();
        if let Some(banner) = retired {
            for timer in banner.timers {
                self.scheduler.cancel(timer);
            }
            self.tree.remove(banner.node);
        }
        for stray in self.tree.query_all(&format!(".{}", BANNER_CLASS)) {
            self.tree.remove(stray);
        }
    }

    /// Detaches `node` if it is still the live banner or at least still attached.
    fn remove_banner(&self, node: NodeId) {
        let is_current = self.current.borrow().as_ref().map_or(false, |banner| banner.node == node);
        if is_current {
            let retired = self.current.borrow_mut().take();
            if let Some(banner) = retired {
                for timer in banner.timers {
                    self.scheduler.cancel(timer);
                }
            }
        }
        if self.tree.remove(node) {
            debug!("Notification dismissed");
        }
    }

    fn begin_exit(self: &Rc<Self>, node: NodeId) {
        if !self.tree.is_attached(node) {
            return;
        }
        let exit = format!("slideOutRight {}s ease", f64::from(self.timing.exit_ms) / 1000.0);
        self.tree.set_style(node, "animation", &exit);
        let weak = Rc::downgrade(self);
        let handle = self.scheduler.after(
            self.timing.exit_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.remove_banner(node);
                }
            }),
        );
        if let Some(banner) = self.current.borrow_mut().as_mut().filter(|banner| banner.node == node) {
            banner.timers.push(handle);
        }
    }

    fn render(&self, message: &str, kind: NotificationKind) -> (NodeId, NodeId) {
        let tree = self.tree.as_ref();
        let banner = build(tree, "div", &format!("{} {}", BANNER_CLASS, kind.class()), None);
        let content = build(tree, "div", "notification-content", None);
        let icon = build(tree, "span", "notification-icon", Some(kind.icon()));
        let text = build(tree, "span", "notification-message", Some(message));
        let close = build(tree, "button", "notification-close", Some("✕"));

        tree.set_styles(banner, &[
            ("position", "fixed"),
            ("top", "90px"),
            ("right", "20px"),
            ("background", kind.color()),
            ("color", "white"),
            ("padding", "1.2rem 1.5rem"),
            ("border-radius", "12px"),
            ("box-shadow", "0 10px 30px rgba(0,0,0,0.2)"),
            ("z-index", "10000"),
            ("animation", "slideInRight 0.3s ease"),
            ("max-width", "400px"),
        ]);
        tree.set_styles(content, &[("display", "flex"), ("align-items", "center"), ("gap", "1rem")]);
        tree.set_styles(icon, &[("font-size", "1.5rem"), ("font-weight", "bold")]);
        tree.set_styles(text, &[("flex", "1"), ("line-height", "1.5")]);
        tree.set_styles(close, &[
            ("background", "none"),
            ("border", "none"),
            ("color", "white"),
            ("font-size", "1.3rem"),
            ("cursor", "pointer"),
            ("padding", "0"),
            ("width", "25px"),
            ("height", "25px"),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("border-radius", "50%"),
            ("transition", "background 0.3s"),
        ]);

        tree.append_child(content, icon);
        tree.append_child(content, text);
        tree.append_child(content, close);
        tree.append_child(banner, content);
        (banner, close)
    }
}

/// Transient status banners, at most one on the page at a time.
///
/// Cloning yields another handle to the same center.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Rc<Inner>,
}

impl NotificationCenter {
    pub fn new(tree: Rc<dyn PresentationTree>, scheduler: Rc<dyn Scheduler>, timing: NotificationTiming) -> Self {
        Self {
            inner: Rc::new(Inner { tree, scheduler, timing, current: RefCell::new(None) }),
        }
    }

    /// Shows `message`, replacing any banner already on screen.
    pub fn notify(&self, message: &str, kind: NotificationKind) {
        let inner = &self.inner;
        inner.retire();

        let (banner, close) = inner.render(message, kind);
        let body = inner.tree.body();
        inner.tree.append_child(body, banner);

        let weak: Weak<Inner> = Rc::downgrade(inner);
        inner.tree.listen(close, EventKind::Click, Box::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.remove_banner(banner);
            }
        }));

        let weak = Rc::downgrade(inner);
        let auto_dismiss = inner.scheduler.after(
            inner.timing.visible_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.begin_exit(banner);
                }
            }),
        );
        *inner.current.borrow_mut() = Some(Banner { node: banner, timers: vec![auto_dismiss] });
        debug!("Notification shown ({})", kind.class());
    }

    /// Removes the current banner immediately. Does nothing when none is shown.
    pub fn dismiss(&self) {
        let current = self.inner.current.borrow().as_ref().map(|banner| banner.node);
        if let Some(node) = current {
            self.inner.remove_banner(node);
        }
    }

    /// Handle of the banner on screen, if any.
    pub fn current(&self) -> Option<NodeId> {
        self.inner.current.borrow().as_ref().map(|banner| banner.node)
    }

    /// Non-owning handle for listeners stored in the tree.
    pub fn downgrade(&self) -> WeakNotificationCenter {
        WeakNotificationCenter { inner: Rc::downgrade(&self.inner) }
    }
}

#[derive(Clone)]
pub struct WeakNotificationCenter {
    inner: Weak<Inner>,
}

impl WeakNotificationCenter {
    pub fn upgrade(&self) -> Option<NotificationCenter> {
        self.inner.upgrade().map(|inner| NotificationCenter { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;
    use crate::scheduler::ManualScheduler;

    fn setup() -> (Rc<MemoryTree>, Rc<ManualScheduler>, NotificationCenter) {
        let tree = Rc::new(MemoryTree::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let center = NotificationCenter::new(tree.clone(), scheduler.clone(), NotificationTiming::default());
        (tree, scheduler, center)
    }

    fn banners(tree: &MemoryTree) -> Vec<NodeId> {
        tree.query_all(".notification")
    }

    #[test]
    fn second_notify_replaces_the_first() {
        let (tree, _, center) = setup();
        center.notify("first", NotificationKind::Success);
        center.notify("second", NotificationKind::Warning);

        let shown = banners(&tree);
        assert_eq!(shown.len(), 1);
        assert!(tree.has_class(shown[0], "warning"));
        let message = tree.query_in(shown[0], ".notification-message")[0];
        assert_eq!(tree.text(message), "second");
        assert_eq!(tree.style(shown[0], "background").as_deref(), Some("#FF6B35"));
    }

    #[test]
    fn banner_leaves_after_delay_and_exit_transition() {
        let (tree, scheduler, center) = setup();
        center.notify("saved", NotificationKind::Success);
        let banner = center.current().unwrap();

        scheduler.advance(4_999);
        assert!(tree.is_attached(banner));
        assert_eq!(tree.style(banner, "animation").as_deref(), Some("slideInRight 0.3s ease"));

        scheduler.advance(1);
        assert_eq!(tree.style(banner, "animation").as_deref(), Some("slideOutRight 0.3s ease"));
        scheduler.advance(299);
        assert!(tree.is_attached(banner));

        scheduler.advance(1);
        assert!(!tree.is_attached(banner));
        assert!(banners(&tree).is_empty());
        assert_eq!(center.current(), None);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn close_button_removes_banner_immediately() {
        let (tree, scheduler, center) = setup();
        center.notify("hello", NotificationKind::Success);
        let close = tree.query(".notification-close").unwrap();

        tree.click(close);
        assert!(banners(&tree).is_empty());
        assert_eq!(scheduler.pending(), 0);

        // Late timers and repeated dismissals are no-ops.
        scheduler.advance(10_000);
        center.dismiss();
        assert!(banners(&tree).is_empty());
    }

    #[test]
    fn notify_during_exit_transition_keeps_one_banner() {
        let (tree, scheduler, center) = setup();
        center.notify("old", NotificationKind::Success);
        scheduler.advance(5_100);
        center.notify("new", NotificationKind::Success);
        assert_eq!(banners(&tree).len(), 1);

        scheduler.advance(200);
        let shown = banners(&tree);
        assert_eq!(shown.len(), 1);
        assert_eq!(tree.text(tree.query(".notification-message").unwrap()), "new");
        assert_eq!(center.current(), Some(shown[0]));
    }

    #[test]
    fn replaced_and_dismissed_banners_are_released() {
        let (tree, scheduler, center) = setup();
        let baseline = tree.node_count();
        center.notify("first", NotificationKind::Success);
        let per_banner = tree.node_count() - baseline;

        for round in 0..10 {
            center.notify(&format!("round {}", round), NotificationKind::Warning);
        }
        assert_eq!(tree.node_count(), baseline + per_banner);

        tree.click(tree.query(".notification-close").unwrap());
        assert_eq!(tree.node_count(), baseline);
        scheduler.advance(10_000);
        assert_eq!(tree.node_count(), baseline);
    }

    #[test]
    fn stray_banners_are_swept() {
        let (tree, _, center) = setup();
        tree.element(tree.body(), "div", &[("class", "notification success")]);
        center.notify("fresh", NotificationKind::Success);
        assert_eq!(banners(&tree).len(), 1);
    }

    #[test]
    fn message_is_rendered_as_text() {
        let (tree, _, center) = setup();
        center.notify("<b>bold</b>", NotificationKind::Success);
        let message = tree.query(".notification-message").unwrap();
        assert_eq!(tree.text(message), "<b>bold</b>");
        assert!(tree.query_in(message, "b").is_empty());
    }
}
