use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, EventTarget, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    Node, ScrollBehavior, ScrollToOptions, Window,
};

use super::{Event, EventKind, Listener, NodeId, PresentationTree};
use crate::error::DomError;

const WINDOW: NodeId = NodeId(0);
const DOCUMENT: NodeId = NodeId(1);
/// Attribute stamping each registered element with its handle.
const NODE_ATTRIBUTE: &str = "data-ui-node";

struct Registration {
    node: NodeId,
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

/// Presentation tree over the live browser document.
///
/// Registered listeners are kept alive by the tree and removed from the page
/// when the tree is dropped.
pub struct WebTree {
    window: Window,
    document: Document,
    elements: RefCell<HashMap<NodeId, Element>>,
    next_id: Cell<u64>,
    registrations: RefCell<Vec<Registration>>,
    /// Pruned registrations, dropped on the next prune since one of them may be running.
    retired: RefCell<Vec<Registration>>,
}

impl WebTree {
    pub fn from_window() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or(DomError::NoWindow)?;
        let document = window.document().ok_or(DomError::NoWindow)?;
        Ok(Self {
            window,
            document,
            elements: RefCell::new(HashMap::new()),
            next_id: Cell::new(2),
            registrations: RefCell::new(Vec::new()),
            retired: RefCell::new(Vec::new()),
        })
    }

    fn register(&self, element: Element) -> NodeId {
        if let Some(id) = element.get_attribute(NODE_ATTRIBUTE).and_then(|raw| raw.parse().ok()) {
            let node = NodeId(id);
            if self.elements.borrow().contains_key(&node) {
                return node;
            }
        }
        let node = NodeId(self.next_id.get());
        self.next_id.set(node.0 + 1);
        let _ = element.set_attribute(NODE_ATTRIBUTE, &node.0.to_string());
        self.elements.borrow_mut().insert(node, element);
        node
    }

    fn element(&self, node: NodeId) -> Result<Element, DomError> {
        if node == DOCUMENT {
            return self.document.document_element().ok_or(DomError::UnknownNode(node));
        }
        self.elements.borrow().get(&node).cloned().ok_or(DomError::UnknownNode(node))
    }

    fn html_element(&self, node: NodeId) -> Result<HtmlElement, DomError> {
        self.element(node)?.dyn_into::<HtmlElement>().map_err(|_| DomError::UnknownNode(node))
    }

    fn target(&self, node: NodeId) -> Result<EventTarget, DomError> {
        if node == WINDOW {
            return Ok(self.window.clone().into());
        }
        Ok(self.element(node)?.into())
    }

    fn try_query_in(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = if root == DOCUMENT {
            self.document.query_selector_all(selector)
        } else {
            self.element(root)?.query_selector_all(selector)
        }
        .map_err(|e| DomError::js("querySelectorAll", e))?;
        Ok((0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.register(element))
            .collect())
    }

    fn try_insert_after(&self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let reference = self.element(reference)?;
        let node = self.element(node)?;
        reference.after_with_node_1(&node).map_err(|e| DomError::js("after", e))
    }

    fn try_set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let style = self.html_element(node)?.style();
        if value.is_empty() {
            style.remove_property(property).map_err(|e| DomError::js("removeProperty", e))?;
        } else {
            style.set_property(property, value).map_err(|e| DomError::js("setProperty", e))?;
        }
        Ok(())
    }

    fn try_listen(&self, node: NodeId, kind: EventKind, mut listener: Listener) -> Result<(), DomError> {
        let target = self.target(node)?;
        let callback = Closure::wrap(Box::new(move |dom_event: web_sys::Event| {
            let event = Event::new(kind);
            listener(&event);
            if event.default_prevented() {
                dom_event.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        target
            .add_event_listener_with_callback(kind.dom_name(), callback.as_ref().unchecked_ref())
            .map_err(|e| DomError::js("addEventListener", e))?;
        self.registrations.borrow_mut().push(Registration { node, target, event: kind.dom_name(), callback });
        Ok(())
    }

    /// Drops listeners of elements that left the document.
    fn prune_registrations(&self) {
        let previous = std::mem::take(&mut *self.retired.borrow_mut());
        drop(previous);

        let elements = self.elements.borrow();
        let (live, stale): (Vec<_>, Vec<_>) =
            self.registrations.borrow_mut().drain(..).partition(|registration| {
                registration.node == WINDOW
                    || elements.get(&registration.node).map_or(false, |element| element.is_connected())
            });
        for registration in &stale {
            let _ = registration
                .target
                .remove_event_listener_with_callback(registration.event, registration.callback.as_ref().unchecked_ref());
        }
        *self.registrations.borrow_mut() = live;
        *self.retired.borrow_mut() = stale;
    }
}

impl Drop for WebTree {
    fn drop(&mut self) {
        self.retired.get_mut().clear();
        for registration in self.registrations.get_mut().drain(..) {
            let _ = registration
                .target
                .remove_event_listener_with_callback(registration.event, registration.callback.as_ref().unchecked_ref());
        }
    }
}

fn log_failure<T: Default>(result: Result<T, DomError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("DOM operation skipped: {}", e);
        T::default()
    })
}

impl PresentationTree for WebTree {
    fn document(&self) -> NodeId {
        DOCUMENT
    }

    fn window(&self) -> NodeId {
        WINDOW
    }

    fn head(&self) -> NodeId {
        match self.document.head() {
            Some(head) => self.register(head.into()),
            None => DOCUMENT,
        }
    }

    fn body(&self) -> NodeId {
        match self.document.body() {
            Some(body) => self.register(body.into()),
            None => DOCUMENT,
        }
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.document.get_element_by_id(id).map(|element| self.register(element))
    }

    fn query_in(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        log_failure(self.try_query_in(root, selector))
    }

    fn create_element(&self, tag: &str) -> NodeId {
        match self.document.create_element(tag) {
            Ok(element) => self.register(element),
            Err(e) => {
                warn!("{}", DomError::js("createElement", e));
                // Unregistered handle: every later operation on it is a no-op.
                let node = NodeId(self.next_id.get());
                self.next_id.set(node.0 + 1);
                node
            }
        }
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        log_failure(
            self.element(parent)
                .and_then(|parent| Ok((parent, self.element(child)?)))
                .and_then(|(parent, child)| parent.append_child(&child).map_err(|e| DomError::js("appendChild", e)))
                .map(|_| ()),
        )
    }

    fn insert_after(&self, reference: NodeId, node: NodeId) {
        log_failure(self.try_insert_after(reference, node))
    }

    fn remove(&self, node: NodeId) -> bool {
        let Ok(element) = self.element(node) else {
            return false;
        };
        let attached = element.is_connected();
        element.remove();
        self.elements.borrow_mut().retain(|_, known| {
            let known: &Node = known;
            !element.contains(Some(known))
        });
        self.prune_registrations();
        attached
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.element(node).map_or(false, |element| element.is_connected())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.element(node).ok()?.parent_element()?;
        Some(self.register(parent))
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let sibling = self.element(node).ok()?.next_element_sibling()?;
        Some(self.register(sibling))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).ok()?.get_attribute(name)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        log_failure(
            self.element(node)
                .and_then(|element| element.set_attribute(name, value).map_err(|e| DomError::js("setAttribute", e))),
        )
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        log_failure(
            self.element(node)
                .and_then(|element| element.remove_attribute(name).map_err(|e| DomError::js("removeAttribute", e))),
        )
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).map_or(false, |element| element.class_list().contains(class))
    }

    fn add_class(&self, node: NodeId, class: &str) {
        log_failure(
            self.element(node)
                .and_then(|element| element.class_list().add_1(class).map_err(|e| DomError::js("classList.add", e))),
        )
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        log_failure(self.element(node).and_then(|element| {
            element.class_list().remove_1(class).map_err(|e| DomError::js("classList.remove", e))
        }))
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let value = self.html_element(node).ok()?.style().get_property_value(property).ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) {
        log_failure(self.try_set_style(node, property, value))
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node).ok().and_then(|element| element.text_content()).unwrap_or_default()
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Ok(element) = self.element(node) {
            element.set_text_content(Some(text));
        }
    }

    fn value(&self, node: NodeId) -> String {
        let Ok(element) = self.element(node) else {
            return String::new();
        };
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, node: NodeId, value: &str) {
        let Ok(element) = self.element(node) else {
            return;
        };
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        self.html_element(node).map_or(0.0, |element| element.offset_top() as f64)
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.html_element(node).map_or(0.0, |element| element.offset_height() as f64)
    }

    fn viewport_height(&self) -> f64 {
        self.window.inner_height().ok().and_then(|height| height.as_f64()).unwrap_or(0.0)
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&self, y: f64) {
        let options = ScrollToOptions::new();
        options.set_top(y);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn listen(&self, node: NodeId, kind: EventKind, listener: Listener) {
        log_failure(self.try_listen(node, kind, listener))
    }
}
