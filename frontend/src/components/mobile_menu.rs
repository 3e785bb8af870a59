use std::rc::Rc;

use crate::dom::{EventKind, NodeId, PresentationTree};

const OPEN_LABEL: &str = "☰";
const CLOSE_LABEL: &str = "✕";

/// Burger button that slides the nav links over the page on small screens.
pub struct MobileMenu {
    button: NodeId,
    links: NodeId,
}

impl MobileMenu {
    /// Wires the menu when the page has both the button and the link list.
    pub fn mount(tree: &Rc<dyn PresentationTree>) -> Option<Self> {
        let button = tree.query(".mobile-menu-btn")?;
        let links = tree.query(".nav-links")?;

        let weak = Rc::downgrade(tree);
        tree.listen(button, EventKind::Click, Box::new(move |_| {
            if let Some(tree) = weak.upgrade() {
                let open = tree.toggle_class(links, "active");
                tree.set_text(button, if open { CLOSE_LABEL } else { OPEN_LABEL });
            }
        }));

        for link in tree.query_in(links, "a") {
            let weak = Rc::downgrade(tree);
            tree.listen(link, EventKind::Click, Box::new(move |_| {
                if let Some(tree) = weak.upgrade() {
                    tree.remove_class(links, "active");
                    tree.set_text(button, OPEN_LABEL);
                }
            }));
        }
        Some(Self { button, links })
    }

    pub fn is_open(&self, tree: &dyn PresentationTree) -> bool {
        tree.has_class(self.links, "active")
    }

    pub fn button(&self) -> NodeId {
        self.button
    }
}
