//! Container resolution
//!
//! Maps a container key to the element that renders it. Resolution is never
//! cached: panes mount lazily, so the same key can resolve to nothing now
//! and to an element later.

#[cfg(target_arch = "wasm32")]
pub mod selector;

use crate::dom::walk::closest_within;
use crate::dom::{descendants, TextTree};
use crate::markers::{ContainerKey, MarkerPolicy};

/// Finds container elements for keys, and the container owning a node
pub trait ContainerResolver<T: TextTree> {
    /// First container for `key` inside `scope`
    fn resolve(&self, tree: &T, scope: &T::Node, key: &ContainerKey) -> Option<T::Node>;

    /// Closest container enclosing `node` (inclusive)
    fn container_of(&self, tree: &T, node: &T::Node) -> Option<T::Node>;

    /// Key of a container element
    fn key_of(&self, tree: &T, container: &T::Node) -> Option<ContainerKey>;

    /// Resolve across several mounted scopes, first match wins
    fn resolve_any(&self, tree: &T, scopes: &[T::Node], key: &ContainerKey) -> Option<T::Node> {
        scopes.iter().find_map(|scope| self.resolve(tree, scope, key))
    }
}

/// Resolver that walks the tree and matches container attributes
#[derive(Debug, Clone)]
pub struct ScanResolver {
    policy: MarkerPolicy,
}

impl ScanResolver {
    pub fn new(policy: MarkerPolicy) -> Self {
        Self { policy }
    }
}

impl<T: TextTree> ContainerResolver<T> for ScanResolver {
    fn resolve(&self, tree: &T, scope: &T::Node, key: &ContainerKey) -> Option<T::Node> {
        let matches = |node: &T::Node| {
            self.policy.container.matches(tree, node) && self.policy.key_of(tree, node).as_ref() == Some(key)
        };
        if matches(scope) {
            return Some(scope.clone());
        }
        descendants(tree, scope).into_iter().find(|node| matches(node))
    }

    fn container_of(&self, tree: &T, node: &T::Node) -> Option<T::Node> {
        closest_within(tree, node, None, |n| self.policy.container.matches(tree, n))
    }

    fn key_of(&self, tree: &T, container: &T::Node) -> Option<ContainerKey> {
        self.policy.key_of(tree, container)
    }
}
