//! Resolver backed by `querySelector` / `closest` on the live DOM

use wasm_bindgen::JsCast;
use web_sys::{Element, Node};

use super::ContainerResolver;
use crate::dom::browser::BrowserDom;
use crate::markers::{ContainerKey, MarkerPolicy};

#[derive(Debug, Clone)]
pub struct SelectorResolver {
    policy: MarkerPolicy,
}

impl SelectorResolver {
    pub fn new(policy: MarkerPolicy) -> Self {
        Self { policy }
    }
}

/// The node itself when it is an element, else its parent element
fn element_of(node: &Node) -> Option<Element> {
    match node.dyn_ref::<Element>() {
        Some(element) => Some(element.clone()),
        None => node.parent_element(),
    }
}

impl ContainerResolver<BrowserDom> for SelectorResolver {
    fn resolve(&self, _tree: &BrowserDom, scope: &Node, key: &ContainerKey) -> Option<Node> {
        let selector = self.policy.container_selector(key);
        let scope = scope.dyn_ref::<Element>()?;
        if scope.matches(&selector).unwrap_or(false) {
            return Some(scope.clone().into());
        }
        match scope.query_selector(&selector) {
            Ok(found) => found.map(Node::from),
            Err(err) => {
                log::warn!("bad container selector {:?}: {:?}", selector, err);
                None
            }
        }
    }

    fn container_of(&self, _tree: &BrowserDom, node: &Node) -> Option<Node> {
        let selector = self.policy.container.selector();
        element_of(node)?.closest(&selector).ok().flatten().map(Node::from)
    }

    fn key_of(&self, tree: &BrowserDom, container: &Node) -> Option<ContainerKey> {
        self.policy.key_of(tree, container)
    }
}
