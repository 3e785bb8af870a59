//! Presentation tree abstraction.
//!
//! Page behaviors never touch `web_sys` directly. They talk to a
//! [`PresentationTree`], which the browser backs with [`WebTree`] and tests back
//! with [`MemoryTree`].

use std::cell::Cell;

mod memory;
mod web;

pub use memory::MemoryTree;
pub use web::WebTree;

/// Opaque handle to an element (or the window) inside a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Blur,
    Input,
    Submit,
    Scroll,
    MouseEnter,
    MouseLeave,
}

impl EventKind {
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Blur => "blur",
            EventKind::Input => "input",
            EventKind::Submit => "submit",
            EventKind::Scroll => "scroll",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
        }
    }
}

/// What a listener sees of an event.
#[derive(Debug)]
pub struct Event {
    kind: EventKind,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, default_prevented: Cell::new(false) }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type Listener = Box<dyn FnMut(&Event)>;

/// Element lookup, mutation and event subscription.
///
/// Methods take `&self` so listeners can call back into the tree while it is
/// dispatching. Operations on detached or unknown nodes are no-ops.
pub trait PresentationTree {
    fn document(&self) -> NodeId;
    /// Scroll target for window-level listeners.
    fn window(&self) -> NodeId;
    fn head(&self) -> NodeId;
    fn body(&self) -> NodeId;

    fn by_id(&self, id: &str) -> Option<NodeId>;
    /// Elements under `root` matching a selector list. Supports tag, `#id` and
    /// `.class` compounds joined by descendant combinators.
    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_in(self.document(), selector)
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn create_element(&self, tag: &str) -> NodeId;
    fn append_child(&self, parent: NodeId, child: NodeId);
    fn insert_after(&self, reference: NodeId, node: NodeId);
    /// Detaches `node` and forgets it with its descendants, so their handles turn
    /// unknown. Returns false when it was not attached.
    fn remove(&self, node: NodeId) -> bool;
    fn is_attached(&self, node: NodeId) -> bool;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&self, node: NodeId, name: &str);

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);

    /// Flips `class` and returns whether it is now present.
    fn toggle_class(&self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    /// An empty value removes the property.
    fn set_style(&self, node: NodeId, property: &str, value: &str);

    fn set_styles(&self, node: NodeId, declarations: &[(&str, &str)]) {
        for (property, value) in declarations {
            self.set_style(node, property, value);
        }
    }

    /// Text content of the node and its descendants.
    fn text(&self, node: NodeId) -> String;
    fn set_text(&self, node: NodeId, text: &str);
    /// Current value of a form control.
    fn value(&self, node: NodeId) -> String;
    fn set_value(&self, node: NodeId, value: &str);

    fn offset_top(&self, node: NodeId) -> f64;
    fn offset_height(&self, node: NodeId) -> f64;
    fn viewport_height(&self) -> f64;
    fn scroll_y(&self) -> f64;
    fn scroll_to(&self, y: f64);

    fn listen(&self, node: NodeId, kind: EventKind, listener: Listener);
}

/// Creates an element with a class name and optional text, without attaching it.
pub fn build(tree: &dyn PresentationTree, tag: &str, class: &str, text: Option<&str>) -> NodeId {
    let node = tree.create_element(tag);
    if !class.is_empty() {
        tree.set_attribute(node, "class", class);
    }
    if let Some(text) = text {
        tree.set_text(node, text);
    }
    node
}
