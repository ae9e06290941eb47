//! Reactive Views
//!
//! A [`ReactiveState`] owns the data of one component instance as an arena
//! of views. The root view wraps the data object; every nested object or
//! array that the mapping tree types gets its own view, created on first
//! access and reused afterwards, so a nested handle stays valid for the
//! lifetime of the state.
//!
//! Scalar reads are served from the backing store, falling back to the
//! mapping's `get` callback, whose result is memoized until the next write.
//! Scalar writes run the mapping's `set` callbacks with the new value;
//! writes into an object or array also run the set callbacks of the node
//! that holds it. Arrays are stored sparsely, so a far index or a large
//! length allocates nothing for the holes.

use crate::error::{RuntimeError, RuntimeResult};
use crate::mapping::tree::{MappingNode, NodeType};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::trace;

/// Reads a value back from the rendered output; receives the loop indices
pub type Getter = Box<dyn Fn(&mut ReactiveState<'_>, &[usize]) -> Value>;

/// Pushes a written value to the rendered output; receives the value and
/// the loop indices
pub type Setter = Box<dyn Fn(&mut ReactiveState<'_>, &Value, &[usize])>;

/// Mapping tree with native callbacks
pub type RuntimeMapping = MappingNode<Getter, Setter>;

pub fn getter<F>(f: F) -> Getter
where
    F: Fn(&mut ReactiveState<'_>, &[usize]) -> Value + 'static,
{
    Box::new(f)
}

pub fn setter<F>(f: F) -> Setter
where
    F: Fn(&mut ReactiveState<'_>, &Value, &[usize]) + 'static,
{
    Box::new(f)
}

/// Handle to one view of a [`ReactiveState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

/// Result of a read: a plain value, or a nested view
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(Value),
    View(ViewId),
}

impl Slot {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(value) => Some(value),
            Slot::View(_) => None,
        }
    }

    pub fn as_view(&self) -> Option<ViewId> {
        match self {
            Slot::View(id) => Some(*id),
            Slot::Value(_) => None,
        }
    }
}

/// One step of a [`BoundView`] path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Prop(String),
    Index(usize),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Prop(name.to_string())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Largest length a JavaScript array can have
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

fn check_index(index: usize) -> RuntimeResult<()> {
    if index < MAX_ARRAY_LENGTH {
        Ok(())
    } else {
        Err(RuntimeError::InvalidArrayIndex { index })
    }
}

fn check_length(length: u64) -> RuntimeResult<usize> {
    if length <= MAX_ARRAY_LENGTH as u64 {
        Ok(length as usize)
    } else {
        Err(RuntimeError::InvalidArrayLength { length })
    }
}

/// Elements of an array view. An index below `len` with no entry is a
/// hole: an element nothing has read or written yet.
#[derive(Default)]
struct SparseArray {
    items: BTreeMap<usize, Value>,
    len: usize,
}

impl SparseArray {
    fn from_values(values: Vec<Value>) -> Self {
        SparseArray {
            len: values.len(),
            items: values.into_iter().enumerate().collect(),
        }
    }

    fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(&index)
    }

    fn is_holey(&self) -> bool {
        self.items.len() < self.len
    }

    /// `index` is below [`MAX_ARRAY_LENGTH`]
    fn insert(&mut self, index: usize, value: Value) {
        self.items.insert(index, value);
        self.len = self.len.max(index + 1);
    }

    fn resize(&mut self, len: usize) {
        if len < self.len {
            self.items.retain(|index, _| *index < len);
        }
        self.len = len;
    }
}

enum Backing {
    Object(Map<String, Value>),
    Array(SparseArray),
}

impl Backing {
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Object(map) => Ok(Backing::Object(map)),
            Value::Array(items) => Ok(Backing::Array(SparseArray::from_values(items))),
            other => Err(RuntimeError::not_an_object(&other)),
        }
    }

    fn empty(node_type: Option<NodeType>) -> Self {
        match node_type {
            Some(NodeType::Array) => Backing::Array(SparseArray::default()),
            _ => Backing::Object(Map::new()),
        }
    }

    /// Moves a nested object or array out of its parent's store, leaving
    /// `null` behind
    fn take_nested(raw: &mut Value, node_type: Option<NodeType>) -> RuntimeResult<Self> {
        if raw.is_null() {
            return Ok(Backing::empty(node_type));
        }
        if raw.is_object() || raw.is_array() {
            return Backing::from_value(raw.take());
        }
        Err(RuntimeError::not_an_object(raw))
    }
}

struct View<'m> {
    mapping: &'m RuntimeMapping,
    backing: Backing,
    props: IndexMap<String, ViewId>,
    items: BTreeMap<usize, ViewId>,
    indices: SmallVec<[usize; 4]>,
}

/// The live data of one component instance
pub struct ReactiveState<'m> {
    views: Vec<View<'m>>,
}

impl<'m> ReactiveState<'m> {
    /// Wraps `data`, which must be an object or an array
    pub fn new(mapping: &'m RuntimeMapping, data: Value) -> RuntimeResult<Self> {
        let backing = Backing::from_value(data)?;
        let mut state = ReactiveState { views: Vec::new() };
        state.alloc(mapping, backing, SmallVec::new());
        Ok(state)
    }

    pub fn root(&self) -> ViewId {
        ViewId(0)
    }

    fn alloc(&mut self, mapping: &'m RuntimeMapping, backing: Backing, indices: SmallVec<[usize; 4]>) -> ViewId {
        let id = ViewId(self.views.len());
        self.views.push(View {
            mapping,
            backing,
            props: IndexMap::new(),
            items: BTreeMap::new(),
            indices,
        });
        id
    }

    fn is_array(&self, view: ViewId) -> bool {
        matches!(self.views[view.0].backing, Backing::Array(_))
    }

    fn indices_with(&self, view: ViewId, index: Option<usize>) -> SmallVec<[usize; 4]> {
        let mut indices = self.views[view.0].indices.clone();
        indices.extend(index);
        indices
    }

    /// Reads property `key` of an object view.
    ///
    /// On an array view `length` and numeric keys are forwarded to
    /// [`len`](Self::len) and [`get_index`](Self::get_index). Keys absent
    /// from the mapping read as `None`.
    pub fn get(&mut self, view: ViewId, key: &str) -> RuntimeResult<Option<Slot>> {
        if self.is_array(view) {
            if key == "length" {
                return Ok(Some(Slot::Value(Value::from(self.len(view)))));
            }
            return match key.parse::<usize>() {
                Ok(index) => self.get_index(view, index),
                Err(_) => Ok(None),
            };
        }

        let mapping = self.views[view.0].mapping;
        let node = match mapping.property(key) {
            Some(node) => node,
            None => return Ok(None),
        };
        if node.node_type.is_some() {
            return self.nested_prop(view, key, node).map(|id| Some(Slot::View(id)));
        }

        let existing = match &self.views[view.0].backing {
            Backing::Object(map) => map.get(key).cloned(),
            Backing::Array(_) => None,
        };
        match existing {
            Some(value) if !value.is_null() => Ok(Some(Slot::Value(value))),
            existing => match &node.get {
                Some(get) => {
                    trace!(key, "reading property back from rendered output");
                    let indices = self.indices_with(view, None);
                    let value = get(self, &indices);
                    if let Backing::Object(map) = &mut self.views[view.0].backing {
                        map.insert(key.to_string(), value.clone());
                    }
                    Ok(Some(Slot::Value(value)))
                }
                None => Ok(existing.map(Slot::Value)),
            },
        }
    }

    /// Reads element `index` of an array view.
    ///
    /// Past the end, with no element getter, this is `None`.
    pub fn get_index(&mut self, view: ViewId, index: usize) -> RuntimeResult<Option<Slot>> {
        if !self.is_array(view) {
            return self.get(view, &index.to_string());
        }
        if check_index(index).is_err() {
            return Ok(None);
        }

        let mapping = self.views[view.0].mapping;
        let element = mapping.element();
        if let Some(node) = element.filter(|node| node.node_type.is_some()) {
            return self.nested_index(view, index, node).map(|id| Some(Slot::View(id)));
        }

        let existing = match &self.views[view.0].backing {
            Backing::Array(array) => array.get(index).cloned(),
            Backing::Object(_) => None,
        };
        match existing {
            Some(value) if !value.is_null() => Ok(Some(Slot::Value(value))),
            existing => match element.and_then(|node| node.get.as_ref()) {
                Some(get) => {
                    trace!(index, "reading element back from rendered output");
                    let indices = self.indices_with(view, Some(index));
                    let value = get(self, &indices);
                    self.store_index(view, index, value.clone());
                    Ok(Some(Slot::Value(value)))
                }
                None => Ok(existing.map(Slot::Value)),
            },
        }
    }

    fn nested_prop(&mut self, view: ViewId, key: &str, node: &'m RuntimeMapping) -> RuntimeResult<ViewId> {
        if let Some(id) = self.views[view.0].props.get(key) {
            return Ok(*id);
        }
        let backing = match &mut self.views[view.0].backing {
            Backing::Object(map) => {
                Backing::take_nested(map.entry(key.to_string()).or_insert(Value::Null), node.node_type)?
            }
            Backing::Array(_) => Backing::empty(node.node_type),
        };
        trace!(key, "creating nested view");
        let indices = self.indices_with(view, None);
        let id = self.alloc(node, backing, indices);
        self.views[view.0].props.insert(key.to_string(), id);
        Ok(id)
    }

    /// A view past the end starts empty and does not change the length
    fn nested_index(&mut self, view: ViewId, index: usize, node: &'m RuntimeMapping) -> RuntimeResult<ViewId> {
        if let Some(id) = self.views[view.0].items.get(&index) {
            return Ok(*id);
        }
        let backing = match &mut self.views[view.0].backing {
            Backing::Array(array) if index < array.len => {
                Backing::take_nested(array.items.entry(index).or_insert(Value::Null), node.node_type)?
            }
            _ => Backing::empty(node.node_type),
        };
        trace!(index, "creating nested view");
        let indices = self.indices_with(view, Some(index));
        let id = self.alloc(node, backing, indices);
        self.views[view.0].items.insert(index, id);
        Ok(id)
    }

    fn store_index(&mut self, view: ViewId, index: usize, value: Value) {
        let slot = &mut self.views[view.0];
        if let Backing::Array(array) = &mut slot.backing {
            array.insert(index, value);
            slot.items.remove(&index);
        }
    }

    /// Sets the length of an array store and forgets item views outside
    /// the elements that survive
    fn resize_backing(&mut self, view: ViewId, len: usize) {
        let slot = &mut self.views[view.0];
        if let Backing::Array(array) = &mut slot.backing {
            let kept = array.len.min(len);
            array.resize(len);
            slot.items.retain(|index, _| *index < kept);
        }
    }

    /// Length of an array view.
    ///
    /// An empty or holey store asks the mapping's length getter and resizes
    /// to its answer.
    pub fn len(&mut self, view: ViewId) -> usize {
        let (len, holey) = match &self.views[view.0].backing {
            Backing::Array(array) => (array.len, array.is_holey()),
            Backing::Object(map) => return map.len(),
        };
        if len > 0 && !holey {
            return len;
        }

        let mapping = self.views[view.0].mapping;
        let get = match mapping.length().and_then(|length| length.get.as_ref()) {
            Some(get) => get,
            None => return len,
        };
        let indices = self.indices_with(view, None);
        let rendered = get(self, &indices)
            .as_u64()
            .and_then(|n| check_length(n).ok())
            .unwrap_or(len);
        trace!(len, rendered, "recovered array length from rendered output");
        self.resize_backing(view, rendered);
        rendered
    }

    /// Writes property `key` of an object view.
    ///
    /// A typed property merges `value` into its nested view, then runs the
    /// property's own set callbacks with `value`. A scalar one runs every
    /// set callback in order, then stores the value. Keys absent from the
    /// mapping are dropped.
    pub fn set(&mut self, view: ViewId, key: &str, value: Value) -> RuntimeResult<()> {
        if self.is_array(view) {
            if key == "length" {
                return match value.as_u64() {
                    Some(length) => self.set_len(view, check_length(length)?),
                    None => Ok(()),
                };
            }
            return match key.parse::<usize>() {
                Ok(index) => self.set_index(view, index, value),
                Err(_) => Ok(()),
            };
        }

        let mapping = self.views[view.0].mapping;
        let node = match mapping.property(key) {
            Some(node) => node,
            None => {
                trace!(key, "dropping write to unmapped property");
                return Ok(());
            }
        };
        let indices = self.indices_with(view, None);
        if node.node_type.is_some() {
            let child = self.nested_prop(view, key, node)?;
            self.merge(child, value.clone())?;
            for set in &node.set {
                set(self, &value, &indices);
            }
            return Ok(());
        }

        for set in &node.set {
            set(self, &value, &indices);
        }
        if let Backing::Object(map) = &mut self.views[view.0].backing {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Writes element `index` of an array view.
    ///
    /// The value is stored first and the array's own set callbacks run with
    /// the whole array. A write at or past the current length then calls
    /// the array's push callback; below it, scalar elements run the element
    /// set callbacks. Typed elements merge into their view before the array
    /// callbacks run.
    pub fn set_index(&mut self, view: ViewId, index: usize, value: Value) -> RuntimeResult<()> {
        self.write_index(view, index, value, true)
    }

    fn write_index(&mut self, view: ViewId, index: usize, value: Value, notify: bool) -> RuntimeResult<()> {
        let previous_len = match &self.views[view.0].backing {
            Backing::Array(array) => array.len,
            Backing::Object(_) => return self.set(view, &index.to_string(), value),
        };
        check_index(index)?;
        let mapping = self.views[view.0].mapping;
        let indices = self.indices_with(view, Some(index));

        if index >= previous_len {
            self.store_index(view, index, value.clone());
            if notify {
                self.run_array_setters(view);
            }
            if let Some(push) = &mapping.push {
                push(self, &value, &indices);
            }
            return Ok(());
        }

        let element = mapping.element();
        if let Some(node) = element.filter(|node| node.node_type.is_some()) {
            let child = self.nested_index(view, index, node)?;
            self.merge(child, value)?;
            if notify {
                self.run_array_setters(view);
            }
            return Ok(());
        }
        self.store_index(view, index, value.clone());
        if notify {
            self.run_array_setters(view);
        }
        if let Some(node) = element {
            for set in &node.set {
                set(self, &value, &indices);
            }
        }
        Ok(())
    }

    /// Resizes an array view.
    ///
    /// Shrinking drops the removed elements, then runs the length set
    /// callbacks with the new length and the array's own set callbacks with
    /// what is left. Growing only adds holes.
    pub fn set_len(&mut self, view: ViewId, len: usize) -> RuntimeResult<()> {
        check_length(len as u64)?;
        self.resize(view, len, true);
        Ok(())
    }

    fn resize(&mut self, view: ViewId, len: usize, notify: bool) {
        let current = match &self.views[view.0].backing {
            Backing::Array(array) => array.len,
            Backing::Object(_) => return,
        };
        self.resize_backing(view, len);
        if len >= current {
            return;
        }
        let mapping = self.views[view.0].mapping;
        if let Some(length) = mapping.length() {
            let indices = self.indices_with(view, None);
            let value = Value::from(len);
            for set in &length.set {
                set(self, &value, &indices);
            }
        }
        if notify {
            self.run_array_setters(view);
        }
    }

    /// Runs the set callbacks of an array view's own mapping node with the
    /// whole array
    fn run_array_setters(&mut self, view: ViewId) {
        let mapping = self.views[view.0].mapping;
        if mapping.set.is_empty() {
            return;
        }
        let value = self.to_json(view);
        let indices = self.indices_with(view, None);
        for set in &mapping.set {
            set(self, &value, &indices);
        }
    }

    /// Assigns every entry of `value` into `view` through the regular write
    /// path. The caller runs the set callbacks of the view itself.
    fn merge(&mut self, view: ViewId, value: Value) -> RuntimeResult<()> {
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    self.set(view, &key, value)?;
                }
            }
            Value::Array(items) => {
                let len = check_length(items.len() as u64)?;
                for (index, value) in items.into_iter().enumerate() {
                    self.write_index(view, index, value, false)?;
                }
                self.resize(view, len, false);
            }
            Value::Null => {}
            other => return Err(RuntimeError::not_an_object(&other)),
        }
        Ok(())
    }

    /// Mapped property names of an object view; stored element indices of
    /// an array, holes left out
    pub fn keys(&self, view: ViewId) -> Vec<String> {
        let slot = &self.views[view.0];
        match &slot.backing {
            Backing::Object(_) => slot.mapping.children.keys().cloned().collect(),
            Backing::Array(array) => array.items.keys().map(|i| i.to_string()).collect(),
        }
    }

    pub fn has(&self, view: ViewId, key: &str) -> bool {
        let slot = &self.views[view.0];
        match &slot.backing {
            Backing::Object(_) => slot.mapping.children.contains_key(key),
            Backing::Array(array) => {
                key == "length"
                    || key
                        .parse::<usize>()
                        .is_ok_and(|index| array.items.contains_key(&index))
            }
        }
    }

    /// Plain copy of a view and everything below it; holes become `null`
    pub fn to_json(&self, view: ViewId) -> Value {
        let slot = &self.views[view.0];
        match &slot.backing {
            Backing::Object(map) => {
                let mut out = map.clone();
                for (key, child) in &slot.props {
                    out.insert(key.clone(), self.to_json(*child));
                }
                Value::Object(out)
            }
            Backing::Array(array) => Value::Array(
                (0..array.len)
                    .map(|index| match slot.items.get(&index) {
                        Some(child) => self.to_json(*child),
                        None => array.get(index).cloned().unwrap_or(Value::Null),
                    })
                    .collect(),
            ),
        }
    }

    fn read(&mut self, view: ViewId, key: &Key) -> RuntimeResult<Option<Slot>> {
        match key {
            Key::Prop(name) => self.get(view, name),
            Key::Index(index) => self.get_index(view, *index),
        }
    }

    fn write(&mut self, view: ViewId, key: &Key, value: Value) -> RuntimeResult<()> {
        match key {
            Key::Prop(name) => self.set(view, name, value),
            Key::Index(index) => self.set_index(view, *index, value),
        }
    }

    fn walk(&mut self, path: &[Key]) -> RuntimeResult<Option<ViewId>> {
        let mut view = self.root();
        for key in path {
            view = match self.read(view, key)? {
                Some(Slot::View(id)) => id,
                _ => return Ok(None),
            };
        }
        Ok(Some(view))
    }
}

/// Path-based access to a component's data, as bound templates see it
pub trait BoundView {
    /// Reads the value at `path`; nested views are copied out as JSON
    fn get_path(&mut self, path: &[Key]) -> RuntimeResult<Option<Value>>;

    /// Writes `value` at `path`; writes below a missing view are dropped
    fn set_path(&mut self, path: &[Key], value: Value) -> RuntimeResult<()>;
}

impl BoundView for ReactiveState<'_> {
    fn get_path(&mut self, path: &[Key]) -> RuntimeResult<Option<Value>> {
        let (last, parents) = match path.split_last() {
            Some(split) => split,
            None => return Ok(Some(self.to_json(self.root()))),
        };
        let view = match self.walk(parents)? {
            Some(view) => view,
            None => return Ok(None),
        };
        Ok(match self.read(view, last)? {
            Some(Slot::Value(value)) => Some(value),
            Some(Slot::View(id)) => Some(self.to_json(id)),
            None => None,
        })
    }

    fn set_path(&mut self, path: &[Key], value: Value) -> RuntimeResult<()> {
        let (last, parents) = match path.split_last() {
            Some(split) => split,
            None => {
                let root = self.root();
                return self.merge(root, value);
            }
        };
        match self.walk(parents)? {
            Some(view) => self.write(view, last, value),
            None => Ok(()),
        }
    }
}
