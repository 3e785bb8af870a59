use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;

use crate::components::counter::{self, StatValue};
use crate::config::UiConfig;
use crate::dom::{EventKind, NodeId, PresentationTree};
use crate::scheduler::Scheduler;

pub const REVEAL_SELECTOR: &str = ".feature-card, .team-card, .step, .benefit-card, .parameter-card, .stat-card";
const REVEAL_THRESHOLD: f64 = 0.1;
/// Bottom margin trimmed off the viewport before reveal checks.
const REVEAL_MARGIN: f64 = 100.0;
const STAT_THRESHOLD: f64 = 0.5;

const SHADOW_SCROLLED: &str = "0 4px 20px rgba(0,0,0,0.15)";
const SHADOW_TOP: &str = "0 4px 16px rgba(0,0,0,0.12)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavbarFrame {
    pub shadow: &'static str,
    pub hidden: bool,
}

/// Navbar look for offset `y`, given the offset seen on the previous scroll event.
pub fn navbar_frame(y: f64, last: f64, config: &UiConfig) -> NavbarFrame {
    NavbarFrame {
        shadow: if y > config.navbar_shadow_after { SHADOW_SCROLLED } else { SHADOW_TOP },
        hidden: y > last && y > config.navbar_hide_after,
    }
}

/// Fraction of the element `[top, top + height)` inside `[view_top, view_bottom)`.
pub fn visible_ratio(top: f64, height: f64, view_top: f64, view_bottom: f64) -> f64 {
    if height <= 0.0 {
        return if top >= view_top && top < view_bottom { 1.0 } else { 0.0 };
    }
    let overlap = (top + height).min(view_bottom) - top.max(view_top);
    (overlap / height).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

/// Id of the section the offset falls in. Later sections win when bands overlap.
pub fn active_section(y: f64, sections: &[SectionBounds], offset: f64) -> Option<&str> {
    sections
        .iter()
        .filter(|section| {
            let top = section.top - offset;
            y > top && y <= top + section.height
        })
        .last()
        .map(|section| section.id.as_str())
}

struct Inner {
    tree: Rc<dyn PresentationTree>,
    scheduler: Rc<dyn Scheduler>,
    config: Rc<UiConfig>,
    nav: Option<NodeId>,
    scroll_top_button: NodeId,
    sections: Vec<NodeId>,
    nav_links: Vec<NodeId>,
    pending_reveal: RefCell<Vec<NodeId>>,
    stat_cards: Vec<NodeId>,
    last_scroll: Cell<f64>,
}

impl Inner {
    fn on_scroll(&self) {
        let tree = self.tree.as_ref();
        let y = tree.scroll_y();

        if let Some(nav) = self.nav {
            let frame = navbar_frame(y, self.last_scroll.get(), &self.config);
            tree.set_style(nav, "box-shadow", frame.shadow);
            tree.set_style(nav, "transform", if frame.hidden { "translateY(-100%)" } else { "translateY(0)" });
        }
        self.last_scroll.set(y);

        let display = if y > self.config.scroll_top_after { "flex" } else { "none" };
        tree.set_style(self.scroll_top_button, "display", display);

        self.highlight_nav_link(y);
        self.reveal(y);
        self.start_counters(y);
    }

    fn highlight_nav_link(&self, y: f64) {
        let sections: Vec<SectionBounds> = self
            .sections
            .iter()
            .filter_map(|node| {
                Some(SectionBounds {
                    id: self.tree.attribute(*node, "id")?,
                    top: self.tree.offset_top(*node),
                    height: self.tree.offset_height(*node),
                })
            })
            .collect();
        let Some(active) = active_section(y, &sections, self.config.section_offset) else {
            return;
        };
        let href = format!("#{}", active);
        for link in &self.nav_links {
            if self.tree.attribute(*link, "href").as_deref() == Some(href.as_str()) {
                self.tree.add_class(*link, "active");
            } else {
                self.tree.remove_class(*link, "active");
            }
        }
    }

    fn reveal(&self, y: f64) {
        let tree = self.tree.as_ref();
        let view_bottom = y + tree.viewport_height() - REVEAL_MARGIN;
        self.pending_reveal.borrow_mut().retain(|node| {
            let ratio = visible_ratio(tree.offset_top(*node), tree.offset_height(*node), y, view_bottom);
            if ratio >= REVEAL_THRESHOLD {
                tree.set_style(*node, "animation", "fadeInUp 0.8s ease forwards");
                tree.set_style(*node, "opacity", "1");
                false
            } else {
                true
            }
        });
    }

    fn start_counters(&self, y: f64) {
        let view_bottom = y + self.tree.viewport_height();
        for card in &self.stat_cards {
            if self.tree.has_class(*card, "animated") {
                continue;
            }
            let ratio = visible_ratio(self.tree.offset_top(*card), self.tree.offset_height(*card), y, view_bottom);
            if ratio < STAT_THRESHOLD {
                continue;
            }
            if let Some(number) = self.tree.query_in(*card, ".stat-number").into_iter().next() {
                if let Some(stat) = StatValue::parse(&self.tree.text(number)) {
                    debug!("Animating stat to {}{}", stat.target, stat.suffix);
                    counter::animate(
                        self.tree.clone(),
                        self.scheduler.clone(),
                        number,
                        stat,
                        self.config.counter_duration_ms,
                        self.config.counter_tick_ms,
                    );
                }
            }
            self.tree.add_class(*card, "animated");
        }
    }
}

/// Everything driven by the window scroll position, plus the scroll-to-top button.
#[derive(Clone)]
pub struct ScrollEffects {
    inner: Rc<Inner>,
}

impl ScrollEffects {
    pub fn mount(tree: Rc<dyn PresentationTree>, scheduler: Rc<dyn Scheduler>, config: Rc<UiConfig>) -> Self {
        let scroll_top_button = create_scroll_top_button(&tree);
        let pending_reveal = tree.query_all(REVEAL_SELECTOR);
        for node in &pending_reveal {
            tree.set_style(*node, "opacity", "0");
        }

        let inner = Rc::new(Inner {
            nav: tree.query("nav"),
            sections: tree.query_all("section").into_iter().filter(|node| tree.has_attribute(*node, "id")).collect(),
            nav_links: tree.query_all(".nav-links a"),
            stat_cards: tree.query_all(".stat-card"),
            pending_reveal: RefCell::new(pending_reveal),
            last_scroll: Cell::new(0.0),
            scroll_top_button,
            tree: tree.clone(),
            scheduler,
            config,
        });

        let weak = Rc::downgrade(&inner);
        tree.listen(tree.window(), EventKind::Scroll, Box::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.on_scroll();
            }
        }));
        Self { inner }
    }

    /// Applies the current scroll position; also called once on mount by the page.
    pub fn refresh(&self) {
        self.inner.on_scroll();
    }

    pub fn scroll_top_button(&self) -> NodeId {
        self.inner.scroll_top_button
    }
}

fn create_scroll_top_button(tree: &Rc<dyn PresentationTree>) -> NodeId {
    let button = crate::dom::build(tree.as_ref(), "button", "scroll-top-btn", Some("↑"));
    tree.set_styles(button, &[
        ("position", "fixed"),
        ("bottom", "30px"),
        ("right", "30px"),
        ("width", "50px"),
        ("height", "50px"),
        ("background", "linear-gradient(135deg, var(--primary-orange), var(--secondary-orange))"),
        ("color", "white"),
        ("border", "none"),
        ("border-radius", "50%"),
        ("font-size", "1.5rem"),
        ("cursor", "pointer"),
        ("display", "none"),
        ("align-items", "center"),
        ("justify-content", "center"),
        ("box-shadow", "0 4px 15px rgba(0,0,0,0.2)"),
        ("z-index", "999"),
        ("transition", "all 0.3s ease"),
    ]);
    tree.append_child(tree.body(), button);

    let weak = Rc::downgrade(tree);
    tree.listen(button, EventKind::Click, Box::new(move |_| {
        if let Some(tree) = weak.upgrade() {
            tree.scroll_to(0.0);
        }
    }));
    for (kind, transform) in [
        (EventKind::MouseEnter, "translateY(-5px) scale(1.1)"),
        (EventKind::MouseLeave, "translateY(0) scale(1)"),
    ] {
        let weak = Rc::downgrade(tree);
        tree.listen(button, kind, Box::new(move |_| {
            if let Some(tree) = weak.upgrade() {
                tree.set_style(button, "transform", transform);
            }
        }));
    }
    button
}

/// Makes in-page anchors scroll smoothly, leaving room for the fixed navbar.
pub fn enable_smooth_scroll(tree: &Rc<dyn PresentationTree>) {
    for anchor in tree.query_all("a") {
        let Some(href) = tree.attribute(anchor, "href").filter(|href| href.starts_with('#')) else {
            continue;
        };
        let weak = Rc::downgrade(tree);
        tree.listen(anchor, EventKind::Click, Box::new(move |event| {
            event.prevent_default();
            let Some(tree) = weak.upgrade() else {
                return;
            };
            let Some(target) = tree.by_id(href.trim_start_matches('#')) else {
                return;
            };
            let nav_height = tree.query("nav").map_or(0.0, |nav| tree.offset_height(nav));
            tree.scroll_to(tree.offset_top(target) - nav_height);
        }));
    }
}
