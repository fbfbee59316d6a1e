//! Index-stable doubly linked sequence
//!
//! Nodes live in a slot arena with a free list; previous/next links are
//! stored as [`NodeId`]s rather than references. Every id carries the
//! generation of its slot, so an id held past a removal never aliases the
//! node that later reuses the slot.
//!
//! The list itself does not track endpoints. Owners (a [`Path`] or a
//! [`Chain`]) hold the ends they care about and update them after splices.
//!
//! [`Path`]: super::path::Path
//! [`Chain`]: super::chain::Chain

use std::ops::{Index, IndexMut};

/// Handle to a node in a [`List`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Traversal direction along `next` (forward) or `prev` (backward) links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A node payload plus its navigational links
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub value: T,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl<T> Node<T> {
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Arena-backed doubly linked list
#[derive(Debug, Clone)]
pub struct List<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True while `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id).map(|node| &mut node.value)
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.prev)
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.next)
    }

    /// Neighbor of `id` in the given direction
    pub fn step(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Forward => self.next(id),
            Direction::Backward => self.prev(id),
        }
    }

    /// Add a node with no links. Used to start a fresh sequence.
    pub fn insert_detached(&mut self, value: T) -> NodeId {
        self.alloc(Node {
            value,
            prev: None,
            next: None,
        })
    }

    /// Splice `value` in directly before `at`
    pub fn insert_before(&mut self, value: T, at: NodeId) -> NodeId {
        let prev = self.live(at).prev;
        let id = self.alloc(Node {
            value,
            prev,
            next: Some(at),
        });
        if let Some(prev) = prev {
            self.live_mut(prev).next = Some(id);
        }
        self.live_mut(at).prev = Some(id);
        id
    }

    /// Splice `value` in directly after `at`
    pub fn insert_after(&mut self, value: T, at: NodeId) -> NodeId {
        let next = self.live(at).next;
        let id = self.alloc(Node {
            value,
            prev: Some(at),
            next,
        });
        if let Some(next) = next {
            self.live_mut(next).prev = Some(id);
        }
        self.live_mut(at).next = Some(id);
        id
    }

    /// Put a new node in `target`'s place, taking over its links.
    /// Returns the new id and the evicted value.
    pub fn replace(&mut self, value: T, target: NodeId) -> (NodeId, T) {
        let old = self.release(target);
        let id = self.alloc(Node {
            value,
            prev: old.prev,
            next: old.next,
        });
        if let Some(prev) = old.prev {
            self.live_mut(prev).next = Some(id);
        }
        if let Some(next) = old.next {
            self.live_mut(next).prev = Some(id);
        }
        (id, old.value)
    }

    /// Unlink `target`, joining its neighbors to each other
    pub fn remove(&mut self, target: NodeId) -> T {
        let old = self.release(target);
        if let Some(prev) = old.prev {
            self.live_mut(prev).next = old.next;
        }
        if let Some(next) = old.next {
            self.live_mut(next).prev = old.prev;
        }
        old.value
    }

    /// Unlink the inclusive run `first..=last` (walking `next` links) and
    /// join the node before the run directly to the node after it.
    /// Values come back in run order.
    ///
    /// # Panics
    /// If `last` is not reachable from `first`.
    pub fn unlink_run(&mut self, first: NodeId, last: NodeId) -> Vec<T> {
        let before = self.live(first).prev;
        let mut ids = vec![first];
        let mut current = first;
        while current != last {
            current = match self.live(current).next {
                Some(next) => next,
                None => panic!("unlink_run: {last:?} is not reachable from {first:?}"),
            };
            ids.push(current);
        }
        let after = self.live(last).next;

        let values = ids.into_iter().map(|id| self.release(id).value).collect();
        if let Some(before) = before {
            self.live_mut(before).next = after;
        }
        if let Some(after) = after {
            self.live_mut(after).prev = before;
        }
        values
    }

    /// Read-only traversal starting at `start`
    pub fn iter(&self, start: Option<NodeId>, direction: Direction) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: Cursor::new(start, direction),
        }
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<T> {
        let slot = match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.node.is_some() => slot,
            _ => panic!("stale node id {id:?}"),
        };
        let node = slot.node.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        match node {
            Some(node) => node,
            None => unreachable!(),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn live(&self, id: NodeId) -> &Node<T> {
        match self.node(id) {
            Some(node) => node,
            None => panic!("stale node id {id:?}"),
        }
    }

    fn live_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.node_mut(id) {
            Some(node) => node,
            None => panic!("stale node id {id:?}"),
        }
    }
}

impl<T> Index<NodeId> for List<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.live(id).value
    }
}

impl<T> IndexMut<NodeId> for List<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.live_mut(id).value
    }
}

/// Detached traversal state.
///
/// Holds no borrow of the list, so the caller may mutate it between calls
/// to [`Cursor::advance`]. The upcoming node is captured before the current
/// one is handed out, which makes removing the current node safe.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    upcoming: Option<NodeId>,
    direction: Direction,
}

impl Cursor {
    pub fn new(start: Option<NodeId>, direction: Direction) -> Self {
        Self {
            upcoming: start,
            direction,
        }
    }

    /// Yield `(current, next_snapshot)`. Ends early if the snapshot node was
    /// itself removed in the meantime.
    pub fn advance<T>(&mut self, list: &List<T>) -> Option<(NodeId, Option<NodeId>)> {
        let current = self.upcoming.filter(|&id| list.contains(id))?;
        let snapshot = list.step(current, self.direction);
        self.upcoming = snapshot;
        Some((current, snapshot))
    }
}

/// Borrowing traversal; see [`List::iter`]
pub struct Iter<'a, T> {
    list: &'a List<T>,
    cursor: Cursor,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.list;
        let (id, _) = self.cursor.advance(list)?;
        Some((id, &list[id]))
    }
}
