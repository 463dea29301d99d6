//! # List Nodes
//!
//! The linkage element embedded inside every entity that can belong to a
//! roster. A node never owns the entity it lives in; it only records where
//! its owner sits relative to its neighbours.

/// A position relative to a list: the sentinel or a real entry.
///
/// Traversal never hands out `Link::Head` as an element, so code after a
/// loop cannot mistake the sentinel for a final entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link<K> {
    /// The list head's sentinel.
    Head,
    /// An entry, named by its owner's key.
    Node(K),
}

impl<K: Copy> Link<K> {
    /// Returns the entry key, or `None` for the sentinel.
    pub fn key(self) -> Option<K> {
        match self {
            Link::Head => None,
            Link::Node(key) => Some(key),
        }
    }
}

/// An intrusive list node.
///
/// A node is unlinked exactly when both of its links name its own owner.
/// The only constructor takes the owner's key, so a node cannot exist in an
/// uninitialized state.
///
/// # Examples
///
/// ```
/// use mudcore::list::ListNode;
///
/// let node = ListNode::new(7u32);
/// assert!(!node.is_linked());
/// assert_eq!(node.owner(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode<K> {
    owner: K,
    pub(crate) next: Link<K>,
    pub(crate) prev: Link<K>,
}

impl<K: Copy + Eq> ListNode<K> {
    /// Creates an unlinked node for the entity keyed by `owner`.
    pub fn new(owner: K) -> Self {
        Self {
            owner,
            next: Link::Node(owner),
            prev: Link::Node(owner),
        }
    }

    /// The key of the entity this node is embedded in.
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Puts the node back into the unlinked state.
    ///
    /// Only valid while the node is not part of a list; resetting a member
    /// leaves its neighbours pointing at it.
    pub fn reset(&mut self) {
        self.next = Link::Node(self.owner);
        self.prev = Link::Node(self.owner);
    }

    /// Returns true if the node is currently threaded into some list.
    pub fn is_linked(&self) -> bool {
        self.next != Link::Node(self.owner)
    }

    /// The following position, `Link::Head` at the tail.
    pub fn next(&self) -> Link<K> {
        self.next
    }

    /// The preceding position, `Link::Head` at the front.
    pub fn prev(&self) -> Link<K> {
        self.prev
    }
}
