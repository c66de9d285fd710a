//! Per-element attribute storage.
//!
//! [`GraphStore`] keeps one insertion-ordered map per vertex, per edge, and
//! one for the graph itself. Element maps are created on first write and
//! dropped again when their last key is removed, so reading an element never
//! allocates.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use super::external_ref::ExternalRef;
use super::value::AttributeValue;

/// Insertion-ordered attribute map of one element.
pub type AttrMap<K, A> = IndexMap<K, A, FxBuildHasher>;

/// Identity of an element within a store.
pub trait ElementId: Eq + Hash + Clone + Send + Sync + 'static {}

impl<T: Eq + Hash + Clone + Send + Sync + 'static> ElementId for T {}

/// An element that can carry attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element<V, E> {
    /// A vertex.
    Vertex(V),
    /// An edge.
    Edge(E),
    /// The graph as a whole.
    Graph,
}

/// Attribute storage for the elements of one graph.
///
/// `V` and `E` identify vertices and edges, `K` is the attribute key and
/// `A` the attribute value.
pub struct GraphStore<V, E, K, A> {
    vertices: DashMap<V, AttrMap<K, A>, FxBuildHasher>,
    edges: DashMap<E, AttrMap<K, A>, FxBuildHasher>,
    graph: RwLock<AttrMap<K, A>>,
}

/// String-keyed typed attributes on integer element ids.
pub type AttributesStore = GraphStore<i64, i64, String, AttributeValue>;

/// String-keyed typed attributes on caller-referenced elements.
pub type RefAttributesStore = GraphStore<ExternalRef, ExternalRef, String, AttributeValue>;

/// String-keyed, reference-valued attributes on integer element ids.
pub type StringRefStore = GraphStore<i64, i64, String, ExternalRef>;

/// Reference-keyed, reference-valued attributes on caller-referenced elements.
pub type AnyStore = GraphStore<ExternalRef, ExternalRef, ExternalRef, ExternalRef>;

impl<V, E, K, A> Default for GraphStore<V, E, K, A>
where
    V: ElementId,
    E: ElementId,
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            vertices: DashMap::with_hasher(FxBuildHasher),
            edges: DashMap::with_hasher(FxBuildHasher),
            graph: RwLock::new(AttrMap::default()),
        }
    }
}

fn remove_from<I, K, A>(
    table: &DashMap<I, AttrMap<K, A>, FxBuildHasher>,
    id: &I,
    key: &K,
) -> Option<A>
where
    I: ElementId,
    K: Eq + Hash,
{
    let (removed, now_empty) = {
        let mut map = table.get_mut(id)?;
        let removed = map.shift_remove(key);
        (removed, map.is_empty())
    };
    if now_empty {
        table.remove_if(id, |_, map| map.is_empty());
    }
    removed
}

impl<V, E, K, A> GraphStore<V, E, K, A>
where
    V: ElementId,
    E: ElementId,
    K: Eq + Hash + Clone,
    A: Clone,
{
    /// An empty store.
    pub fn new() -> Self {
        let store = Self::default();
        tracing::debug!(
            key = std::any::type_name::<K>(),
            value = std::any::type_name::<A>(),
            "attribute store created"
        );
        store
    }

    fn with_map<R>(
        &self,
        element: &Element<V, E>,
        f: impl FnOnce(Option<&AttrMap<K, A>>) -> R,
    ) -> R {
        match element {
            Element::Vertex(v) => {
                let map = self.vertices.get(v);
                f(map.as_deref())
            }
            Element::Edge(e) => {
                let map = self.edges.get(e);
                f(map.as_deref())
            }
            Element::Graph => {
                let map = self.graph.read();
                f(Some(&*map))
            }
        }
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, element: &Element<V, E>, key: &K) -> Option<A> {
        self.with_map(element, |map| map.and_then(|m| m.get(key).cloned()))
    }

    /// Returns `true` if `key` is set on the element.
    pub fn contains_key(&self, element: &Element<V, E>, key: &K) -> bool {
        self.with_map(element, |map| map.is_some_and(|m| m.contains_key(key)))
    }

    /// Set `key` to `value`, returning the previous value.
    ///
    /// Overwriting keeps the key's original position.
    pub fn put(&self, element: &Element<V, E>, key: K, value: A) -> Option<A> {
        match element {
            Element::Vertex(v) => self
                .vertices
                .entry(v.clone())
                .or_default()
                .insert(key, value),
            Element::Edge(e) => self.edges.entry(e.clone()).or_default().insert(key, value),
            Element::Graph => self.graph.write().insert(key, value),
        }
    }

    /// Remove `key`, returning the previous value.
    pub fn remove(&self, element: &Element<V, E>, key: &K) -> Option<A> {
        match element {
            Element::Vertex(v) => remove_from(&self.vertices, v, key),
            Element::Edge(e) => remove_from(&self.edges, e, key),
            Element::Graph => self.graph.write().shift_remove(key),
        }
    }

    /// Number of keys on the element.
    pub fn size(&self, element: &Element<V, E>) -> usize {
        self.with_map(element, |map| map.map_or(0, IndexMap::len))
    }

    /// Key at insertion position `index`.
    pub fn key_at(&self, element: &Element<V, E>, index: usize) -> Option<K> {
        self.with_map(element, |map| {
            map.and_then(|m| m.get_index(index)).map(|(k, _)| k.clone())
        })
    }

    /// Snapshot of the keys in insertion order.
    pub fn key_list(&self, element: &Element<V, E>) -> Vec<K> {
        self.with_map(element, |map| {
            map.map(|m| m.keys().cloned().collect()).unwrap_or_default()
        })
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self, element: &Element<V, E>) -> Vec<(K, A)> {
        self.with_map(element, |map| {
            map.map(|m| m.iter().map(|(k, a)| (k.clone(), a.clone())).collect())
                .unwrap_or_default()
        })
    }

    /// Lazy cursor over the element's keys.
    pub fn keys(self: &Arc<Self>, element: Element<V, E>) -> Keys<V, E, K, A> {
        Keys {
            store: Arc::clone(self),
            element,
            position: AtomicUsize::new(0),
        }
    }

    /// Remove every key of the element.
    pub fn clear(&self, element: &Element<V, E>) {
        match element {
            Element::Vertex(v) => {
                self.vertices.remove(v);
            }
            Element::Edge(e) => {
                self.edges.remove(e);
            }
            Element::Graph => self.graph.write().clear(),
        }
    }

    /// Remove every key of every element.
    pub fn clear_all(&self) {
        self.vertices.clear();
        self.edges.clear();
        self.graph.write().clear();
    }

    /// Number of elements that currently hold storage.
    pub fn element_count(&self) -> usize {
        let graph = usize::from(!self.graph.read().is_empty());
        self.vertices.len() + self.edges.len() + graph
    }
}

/// Restartable cursor over the keys of one element.
///
/// Keys are read from the store on demand. Keys added after the cursor was
/// created are visited if they land past the current position; removing a
/// key before the position shifts later keys back by one.
pub struct Keys<V, E, K, A> {
    store: Arc<GraphStore<V, E, K, A>>,
    element: Element<V, E>,
    position: AtomicUsize,
}

impl<V, E, K, A> Keys<V, E, K, A>
where
    V: ElementId,
    E: ElementId,
    K: Eq + Hash + Clone,
    A: Clone,
{
    /// Returns `true` if another key is available.
    pub fn has_next(&self) -> bool {
        self.position.load(Ordering::Acquire) < self.store.size(&self.element)
    }

    /// Advance and return the next key.
    ///
    /// Concurrent callers on the same cursor never receive the same key.
    pub fn next_key(&self) -> Option<K> {
        self.claim().map(|(_, key)| key)
    }

    /// Advance and convert the next key with `f`.
    ///
    /// If `f` fails the cursor is moved back, so the key is offered again,
    /// unless another caller advanced the cursor in the meantime.
    pub fn try_next<R, Err>(
        &self,
        f: impl FnOnce(K) -> std::result::Result<R, Err>,
    ) -> Option<std::result::Result<R, Err>> {
        let (position, key) = self.claim()?;
        let result = f(key);
        if result.is_err() {
            let _ = self.position.compare_exchange(
                position + 1,
                position,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
        Some(result)
    }

    fn claim(&self) -> Option<(usize, K)> {
        let mut position = self.position.load(Ordering::Acquire);
        loop {
            let key = self.store.key_at(&self.element, position)?;
            match self.position.compare_exchange_weak(
                position,
                position + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some((position, key)),
                Err(current) => position = current,
            }
        }
    }

    /// Start again from the first key.
    pub fn restart(&self) {
        self.position.store(0, Ordering::Release);
    }

    /// The element this cursor walks.
    pub fn element(&self) -> &Element<V, E> {
        &self.element
    }
}

impl<V, E, K, A> Iterator for Keys<V, E, K, A>
where
    V: ElementId,
    E: ElementId,
    K: Eq + Hash + Clone,
    A: Clone,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.next_key()
    }
}
