#![forbid(unsafe_code)]

//! Multi-level queue for selective event processing.
//!
//! Not thread-safe; access must be synchronized externally.
//!
//! A [`MultiQueue`] supports a parent-child relationship with these
//! properties:
//!
//! - pushing an item to a child queue also enqueues a *link node* in the
//!   parent queue;
//! - popping a link node from the parent pops the head of the linked
//!   child queue;
//! - popping directly from a child invalidates the corresponding link
//!   node in the parent.
//!
//! The hierarchy lets an event loop drain one emitter (a single channel,
//! a single job) without consuming events from the others: the loop
//! temporarily polls that emitter's child queue instead of the root.
//!
//! ```text
//!                  +-----------+
//!                  | root loop |
//!                  +-----------+
//!                   ^    ^    ^
//!           +-------+    |    +--------+
//!      +---------+  +---------+  +---------+
//!      | input   |  | channel |  |  job    |
//!      +---------+  +---------+  +---------+
//! ```
//!
//! # Size invariant
//!
//! Every queue counts the value nodes reachable through it:
//! `parent.len() == Σ children.len() + direct items`. The counters are
//! maintained by construction on every push/pop/drop.
//!
//! # Representation
//!
//! Nodes are a tagged enum; links hold a `Weak` reference to the child so
//! queue teardown cannot cycle. A child pop does not scan the parent for
//! its link: it bumps a per-child stale counter that the parent consumes
//! lazily when the link surfaces. Dropping a child orphans its links,
//! which the parent skips when their `Weak` no longer upgrades.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

enum Node<T> {
    /// A value stored directly in this queue.
    Item(T),
    /// Parent-side pointer to a child queue holding the real value.
    Link(Weak<RefCell<Inner<T>>>),
}

struct Inner<T> {
    parent: Option<Weak<RefCell<Inner<T>>>>,
    nodes: VecDeque<Node<T>>,
    /// Value nodes reachable through this queue.
    size: usize,
    /// Links in the parent that were invalidated by a direct pop on this
    /// queue and are waiting to be skipped.
    stale_links: usize,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // Deduct whatever this queue still held from the parent's count.
        // The parent's remaining link nodes to us fail to upgrade and get
        // skipped without further bookkeeping.
        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade)
            && let Ok(mut parent) = parent.try_borrow_mut()
        {
            parent.size -= self.size.min(parent.size);
        }
    }
}

/// A handle to one queue in the hierarchy. Cloning the handle aliases the
/// same queue.
pub struct MultiQueue<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for MultiQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for MultiQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MultiQueue<T> {
    /// Create a root queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                parent: None,
                nodes: VecDeque::new(),
                size: 0,
                stale_links: 0,
            })),
        }
    }

    /// Create a child whose pushes are mirrored into `self`.
    ///
    /// The hierarchy is two levels deep: only a root can have children.
    ///
    /// # Panics
    ///
    /// Panics if `self` is itself a child.
    #[must_use]
    pub fn new_child(&self) -> Self {
        assert!(
            self.inner.borrow().parent.is_none(),
            "only a root queue can have children"
        );
        Self {
            inner: Rc::new(RefCell::new(Inner {
                parent: Some(Rc::downgrade(&self.inner)),
                nodes: VecDeque::new(),
                size: 0,
                stale_links: 0,
            })),
        }
    }

    /// Enqueue an item. On a child queue this also enqueues a link node
    /// in the parent.
    pub fn push(&self, item: T) {
        let mut inner = self.inner.borrow_mut();
        inner.nodes.push_back(Node::Item(item));
        inner.size += 1;

        if let Some(parent) = inner.parent.as_ref().and_then(Weak::upgrade) {
            let mut parent = parent.borrow_mut();
            parent.nodes.push_back(Node::Link(Rc::downgrade(&self.inner)));
            parent.size += 1;
        }
    }

    /// Dequeue the next value in FIFO order.
    ///
    /// On a parent this resolves link nodes: the returned value is the
    /// head of the matched child queue, which is removed from the child
    /// as well. On a child this also invalidates the child's oldest link
    /// node in the parent.
    pub fn pop(&self) -> Option<T> {
        loop {
            let node = self.inner.borrow_mut().nodes.pop_front()?;
            match node {
                Node::Item(item) => {
                    let mut inner = self.inner.borrow_mut();
                    inner.size -= 1;
                    let parent = inner.parent.as_ref().and_then(Weak::upgrade);
                    inner.stale_links += usize::from(inner.parent.is_some());
                    drop(inner);
                    if let Some(parent) = parent {
                        parent.borrow_mut().size -= 1;
                    }
                    return Some(item);
                }
                Node::Link(child) => {
                    let Some(child) = child.upgrade() else {
                        // Child queue was dropped; its size contribution
                        // was settled at drop time.
                        continue;
                    };
                    let mut child = child.borrow_mut();
                    if child.stale_links > 0 {
                        child.stale_links -= 1;
                        continue;
                    }
                    let Some(Node::Item(item)) = child.nodes.pop_front() else {
                        debug_assert!(false, "live link to an empty child");
                        continue;
                    };
                    child.size -= 1;
                    drop(child);
                    self.inner.borrow_mut().size -= 1;
                    return Some(item);
                }
            }
        }
    }

    /// Drain the queue, calling `handler` for every value.
    pub fn process(&self, mut handler: impl FnMut(T)) {
        while let Some(item) = self.pop() {
            handler(item);
        }
    }

    /// Drain the queue, dropping every value unhandled.
    pub fn purge(&self) {
        while self.pop().is_some() {}
    }

    /// Count of value nodes reachable through this queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-home an empty child under a different root.
    ///
    /// # Panics
    ///
    /// Panics if the queue still holds items.
    pub fn replace_parent(&self, new_parent: &Self) {
        assert!(self.is_empty(), "cannot re-parent a non-empty queue");
        assert!(
            new_parent.inner.borrow().parent.is_none(),
            "only a root queue can have children"
        );
        self.inner.borrow_mut().parent = Some(Rc::downgrade(&new_parent.inner));
    }
}

#[cfg(test)]
mod tests {
    use super::MultiQueue;

    #[test]
    fn fifo_on_a_single_queue() {
        let q = MultiQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn child_push_is_visible_through_the_parent() {
        let root = MultiQueue::new();
        let child = root.new_child();
        child.push("a");
        assert_eq!(root.len(), 1);
        assert_eq!(child.len(), 1);
        assert_eq!(root.pop(), Some("a"));
        assert_eq!(root.len(), 0);
        assert_eq!(child.len(), 0);
    }

    #[test]
    fn parent_pop_takes_the_head_of_the_matched_child() {
        let root = MultiQueue::new();
        let a = root.new_child();
        let b = root.new_child();
        a.push(1);
        b.push(10);
        a.push(2);
        // Interleaved FIFO through the root.
        assert_eq!(root.pop(), Some(1));
        assert_eq!(root.pop(), Some(10));
        assert_eq!(root.pop(), Some(2));
    }

    #[test]
    fn child_pop_invalidates_its_parent_link() {
        let root = MultiQueue::new();
        let child = root.new_child();
        child.push(1);
        child.push(2);
        assert_eq!(child.pop(), Some(1));
        assert_eq!(root.len(), 1);
        // The stale link is skipped; the live one still resolves.
        assert_eq!(root.pop(), Some(2));
        assert_eq!(root.pop(), None);
    }

    #[test]
    fn draining_a_child_leaves_other_emitters_untouched() {
        let root = MultiQueue::new();
        let focused = root.new_child();
        let other = root.new_child();
        other.push("x");
        focused.push("f1");
        focused.push("f2");

        // Focus on one emitter, e.g. while waiting on a single channel.
        focused.process(|_| {});
        assert!(focused.is_empty());
        assert_eq!(other.len(), 1);
        assert_eq!(root.len(), 1);
        assert_eq!(root.pop(), Some("x"));
    }

    #[test]
    fn parent_holds_direct_items_too() {
        let root = MultiQueue::new();
        let child = root.new_child();
        root.push(1);
        child.push(2);
        root.push(3);
        assert_eq!(root.len(), 3);
        assert_eq!(root.pop(), Some(1));
        assert_eq!(root.pop(), Some(2));
        assert_eq!(root.pop(), Some(3));
    }

    #[test]
    fn dropping_a_child_orphans_its_links() {
        let root = MultiQueue::new();
        let child = root.new_child();
        child.push(1);
        child.push(2);
        root.push(3);
        drop(child);
        assert_eq!(root.len(), 1);
        assert_eq!(root.pop(), Some(3));
        assert_eq!(root.pop(), None);
    }

    #[test]
    fn purge_discards_without_handling() {
        let root = MultiQueue::new();
        let child = root.new_child();
        child.push(1);
        root.push(2);
        root.purge();
        assert!(root.is_empty());
        assert!(child.is_empty());
    }

    #[test]
    fn replace_parent_re_homes_an_empty_child() {
        let old_root: MultiQueue<i32> = MultiQueue::new();
        let new_root = MultiQueue::new();
        let child = old_root.new_child();
        child.replace_parent(&new_root);
        child.push(7);
        assert_eq!(old_root.len(), 0);
        assert_eq!(new_root.pop(), Some(7));
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn replace_parent_rejects_pending_items() {
        let root = MultiQueue::new();
        let other = MultiQueue::new();
        let child = root.new_child();
        child.push(1);
        child.replace_parent(&other);
    }

    #[test]
    #[should_panic(expected = "root")]
    fn children_cannot_have_children() {
        let root: MultiQueue<i32> = MultiQueue::new();
        let child = root.new_child();
        let _ = child.new_child();
    }
}
