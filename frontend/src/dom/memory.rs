use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use super::{Event, EventKind, Listener, NodeId, PresentationTree};

const WINDOW: NodeId = NodeId(0);
const DOCUMENT: NodeId = NodeId(1);

#[derive(Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    top: f64,
    height: f64,
}

struct Inner {
    nodes: HashMap<NodeId, NodeData>,
    next_id: u64,
    head: NodeId,
    body: NodeId,
    listeners: HashMap<(NodeId, EventKind), Vec<Listener>>,
    scroll_y: f64,
    viewport_height: f64,
}

impl Inner {
    fn insert(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeData { tag: tag.to_ascii_lowercase(), ..Default::default() });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) {
        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.nodes.get_mut(&parent) {
            let at = at.unwrap_or(data.children.len()).min(data.children.len());
            data.children.insert(at, child);
        }
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|data| data.parent.take()) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|child| *child != node);
        }
        true
    }

    /// Drops `node` and its subtree, handing back their listeners.
    fn forget(&mut self, node: NodeId) -> Vec<Listener> {
        let mut doomed = vec![node];
        self.descendants(node, &mut doomed);
        for node in &doomed {
            self.nodes.remove(node);
        }
        let keys: Vec<_> = self.listeners.keys().filter(|(target, _)| doomed.contains(target)).copied().collect();
        keys.into_iter().filter_map(|key| self.listeners.remove(&key)).flatten().collect()
    }

    fn is_attached(&self, mut node: NodeId) -> bool {
        loop {
            if node == DOCUMENT {
                return true;
            }
            match self.nodes.get(&node).and_then(|data| data.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(&root) {
            for child in &data.children {
                out.push(*child);
                self.descendants(*child, out);
            }
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(data) = self.nodes.get(&node) {
            out.push_str(&data.text);
            for child in &data.children {
                self.collect_text(*child, out);
            }
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(data) = self.nodes.get(&node) else {
            return false;
        };
        if compound.tag.as_deref().map_or(false, |tag| tag != data.tag) {
            return false;
        }
        if compound.id.is_some() && compound.id.as_deref() != data.attributes.get("id").map(String::as_str) {
            return false;
        }
        compound.classes.iter().all(|class| data.classes.contains(class))
    }

    fn matches(&self, node: NodeId, chain: &[Compound]) -> bool {
        let Some((last, ancestors)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }
        let mut remaining = ancestors;
        let mut current = self.nodes.get(&node).and_then(|data| data.parent);
        while let Some((wanted, rest)) = remaining.split_last() {
            match current {
                Some(ancestor) => {
                    if self.matches_compound(ancestor, wanted) {
                        remaining = rest;
                    }
                    current = self.nodes.get(&ancestor).and_then(|data| data.parent);
                }
                None => return false,
            }
        }
        true
    }
}

/// One `tag#id.class.class` step of a selector.
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn parse_compound(raw: &str) -> Compound {
    fn flush(marker: Option<char>, current: &mut String, compound: &mut Compound) {
        if current.is_empty() {
            return;
        }
        let part = std::mem::take(current);
        match marker {
            Some('#') => compound.id = Some(part),
            Some('.') => compound.classes.push(part),
            _ => compound.tag = Some(part.to_ascii_lowercase()),
        }
    }

    let mut compound = Compound::default();
    let mut current = String::new();
    let mut marker = None;
    for c in raw.chars() {
        if c == '#' || c == '.' {
            flush(marker, &mut current, &mut compound);
            marker = Some(c);
        } else {
            current.push(c);
        }
    }
    flush(marker, &mut current, &mut compound);
    compound
}

fn parse_selector(selector: &str) -> Vec<Vec<Compound>> {
    selector
        .split(',')
        .map(|group| group.split_whitespace().map(parse_compound).collect::<Vec<_>>())
        .filter(|chain| !chain.is_empty())
        .collect()
}

/// In-memory presentation tree.
///
/// Mirrors the parts of the DOM the page behaviors rely on and adds helpers to
/// build fixtures, fake layout and dispatch events.
pub struct MemoryTree {
    inner: RefCell<Inner>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut inner = Inner {
            nodes: HashMap::new(),
            next_id: 2,
            head: DOCUMENT,
            body: DOCUMENT,
            listeners: HashMap::new(),
            scroll_y: 0.0,
            viewport_height: 800.0,
        };
        inner.nodes.insert(WINDOW, NodeData { tag: "#window".to_string(), ..Default::default() });
        inner.nodes.insert(DOCUMENT, NodeData { tag: "#document".to_string(), ..Default::default() });
        let html = inner.insert("html");
        let head = inner.insert("head");
        let body = inner.insert("body");
        for (parent, child) in [(DOCUMENT, html), (html, head), (html, body)] {
            inner.link(parent, child, None);
        }
        inner.head = head;
        inner.body = body;
        Self { inner: RefCell::new(inner) }
    }

    /// Creates `tag` with the given attributes and appends it to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    pub fn set_layout(&self, node: NodeId, top: f64, height: f64) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.top = top;
            data.height = height;
        }
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.inner.borrow_mut().viewport_height = height;
    }

    /// Number of elements the tree still knows, attached or not.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.borrow().nodes.get(&node).map(|data| data.children.clone()).unwrap_or_default()
    }

    /// Fires `kind` on `node` and returns whether a listener prevented the default.
    pub fn dispatch(&self, node: NodeId, kind: EventKind) -> bool {
        let taken = self.inner.borrow_mut().listeners.remove(&(node, kind));
        let Some(mut listeners) = taken else {
            return false;
        };
        let event = Event::new(kind);
        for listener in listeners.iter_mut() {
            listener(&event);
        }
        let mut inner = self.inner.borrow_mut();
        if node == WINDOW || inner.nodes.contains_key(&node) {
            let slot = inner.listeners.entry((node, kind)).or_default();
            listeners.append(slot);
            *slot = listeners;
        } else {
            // Removed by its own listener.
            drop(inner);
            drop(listeners);
        }
        event.default_prevented()
    }

    pub fn click(&self, node: NodeId) -> bool {
        self.dispatch(node, EventKind::Click)
    }

    /// Types `value` into a control and fires `input`, like a user edit.
    pub fn type_value(&self, node: NodeId, value: &str) {
        self.set_value(node, value);
        self.dispatch(node, EventKind::Input);
    }

    /// Moves the window and fires `scroll` on it.
    pub fn scroll_window(&self, y: f64) {
        self.scroll_to(y);
        self.dispatch(WINDOW, EventKind::Scroll);
    }
}

impl PresentationTree for MemoryTree {
    fn document(&self) -> NodeId {
        DOCUMENT
    }

    fn window(&self) -> NodeId {
        WINDOW
    }

    fn head(&self) -> NodeId {
        self.inner.borrow().head
    }

    fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let mut all = Vec::new();
        inner.descendants(DOCUMENT, &mut all);
        all.into_iter()
            .find(|node| inner.nodes[node].attributes.get("id").map(String::as_str) == Some(id))
    }

    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let chains = parse_selector(selector);
        let inner = self.inner.borrow();
        let mut candidates = Vec::new();
        inner.descendants(root, &mut candidates);
        candidates
            .into_iter()
            .filter(|node| chains.iter().any(|chain| inner.matches(*node, chain)))
            .collect()
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().insert(tag)
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&parent) || !inner.nodes.contains_key(&child) {
            return;
        }
        inner.detach(child);
        inner.link(parent, child, None);
    }

    fn insert_after(&self, reference: NodeId, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        let Some(parent) = inner.nodes.get(&reference).and_then(|data| data.parent) else {
            return;
        };
        if !inner.nodes.contains_key(&node) {
            return;
        }
        inner.detach(node);
        let at = inner.nodes[&parent].children.iter().position(|child| *child == reference).map(|i| i + 1);
        inner.link(parent, node, at);
    }

    fn remove(&self, node: NodeId) -> bool {
        let (detached, dropped) = {
            let mut inner = self.inner.borrow_mut();
            let detached = inner.detach(node);
            (detached, inner.forget(node))
        };
        // Listener captures are released outside the borrow.
        drop(dropped);
        detached
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.inner.borrow().is_attached(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(&node).and_then(|data| data.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let parent = inner.nodes.get(&node)?.parent?;
        let siblings = &inner.nodes.get(&parent)?.children;
        let at = siblings.iter().position(|child| *child == node)?;
        siblings.get(at + 1).copied()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        let data = inner.nodes.get(&node)?;
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            if name == "class" {
                data.classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                data.attributes.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            if name == "class" {
                data.classes.clear();
            } else {
                data.attributes.remove(name);
            }
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner.borrow().nodes.get(&node).map_or(false, |data| data.classes.iter().any(|c| c == class))
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner.borrow().nodes.get(&node)?.styles.get(property).cloned()
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            if value.is_empty() {
                data.styles.remove(property);
            } else {
                data.styles.insert(property.to_string(), value.to_string());
            }
        }
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().collect_text(node, &mut out);
        out
    }

    fn set_text(&self, node: NodeId, text: &str) {
        let mut inner = self.inner.borrow_mut();
        let children = match inner.nodes.get_mut(&node) {
            Some(data) => {
                data.text = text.to_string();
                std::mem::take(&mut data.children)
            }
            None => return,
        };
        for child in children {
            if let Some(data) = inner.nodes.get_mut(&child) {
                data.parent = None;
            }
        }
    }

    fn value(&self, node: NodeId) -> String {
        self.inner.borrow().nodes.get(&node).map(|data| data.value.clone()).unwrap_or_default()
    }

    fn set_value(&self, node: NodeId, value: &str) {
        if let Some(data) = self.inner.borrow_mut().nodes.get_mut(&node) {
            data.value = value.to_string();
        }
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.inner.borrow().nodes.get(&node).map_or(0.0, |data| data.top)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.inner.borrow().nodes.get(&node).map_or(0.0, |data| data.height)
    }

    fn viewport_height(&self) -> f64 {
        self.inner.borrow().viewport_height
    }

    fn scroll_y(&self) -> f64 {
        self.inner.borrow().scroll_y
    }

    fn scroll_to(&self, y: f64) {
        self.inner.borrow_mut().scroll_y = y.max(0.0);
    }

    fn listen(&self, node: NodeId, kind: EventKind, listener: Listener) {
        self.inner.borrow_mut().listeners.entry((node, kind)).or_default().push(listener);
    }
}
