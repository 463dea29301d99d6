//! # Traversal
//!
//! Two traversal forms over a [`List`](super::List):
//!
//! - [`Iter`] borrows the list and its node source for the whole loop, so
//!   the borrow checker rules out mutating either while it runs.
//! - [`Walk`] holds no borrow at all. It captures the position after the
//!   element it yields before handing that element out, so the visitor is
//!   free to unlink (or destroy) the current element. Removing any *other*
//!   element of the same list during the visit is outside the contract and
//!   is caught when the walk advances onto it.

use super::{Link, List, NodeSource};
use std::marker::PhantomData;

/// Order of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First to last.
    Forward,
    /// Last to first.
    Reverse,
}

fn step<K: Copy + Eq, N: NodeSource<K>>(nodes: &N, key: K, direction: Direction) -> Link<K> {
    let node = nodes.node(key);
    match direction {
        Direction::Forward => node.next(),
        Direction::Reverse => node.prev(),
    }
}

/// Borrowing iterator over list keys.
///
/// Holds the list borrowed, and the node source by value; node sources are
/// views, so passing one in keeps the underlying arena borrowed too.
pub struct Iter<'a, K, N> {
    nodes: N,
    position: Link<K>,
    current: Option<K>,
    direction: Direction,
    list: PhantomData<&'a List<K>>,
}

impl<K: Copy + Eq, N: NodeSource<K>> Iter<'_, K, N> {
    pub(crate) fn new(nodes: N, start: Link<K>, direction: Direction) -> Self {
        Self {
            nodes,
            position: start,
            current: None,
            direction,
            list: PhantomData,
        }
    }

    /// The element most recently yielded.
    ///
    /// `None` before the first call and once the traversal has run past
    /// the last element; after a `break` it still names the element the
    /// loop stopped on.
    pub fn current(&self) -> Option<K> {
        self.current
    }
}

impl<K: Copy + Eq, N: NodeSource<K>> Iterator for Iter<'_, K, N> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        match self.position {
            Link::Head => {
                self.current = None;
                None
            }
            Link::Node(key) => {
                self.position = step(&self.nodes, key, self.direction);
                self.current = Some(key);
                Some(key)
            }
        }
    }
}

/// Removal-safe traversal.
///
/// ```
/// use mudcore::list::{List, ListNode, Member};
/// use mudcore::list_member;
/// use slotmap::{new_key_type, SlotMap};
///
/// new_key_type! { struct ItemId; }
/// struct Item { value: u32, node: ListNode<ItemId> }
/// list_member!(ItemNode: Item, ItemId, node);
///
/// let mut items: SlotMap<ItemId, Item> = SlotMap::with_key();
/// let mut list = List::new();
/// for value in 1..=5 {
///     let id = items.insert_with_key(|id| Item { value, node: ListNode::new(id) });
///     list.push_back(&mut ItemNode::within_mut(&mut items), id);
/// }
///
/// let mut walk = list.walk();
/// while let Some(id) = walk.next(&ItemNode::within(&items)) {
///     if items[id].value % 2 == 0 {
///         list.remove(&mut ItemNode::within_mut(&mut items), id);
///     }
/// }
/// assert_eq!(list.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Walk<K> {
    upcoming: Link<K>,
    current: Option<K>,
    direction: Direction,
}

impl<K: Copy + Eq + std::fmt::Debug> Walk<K> {
    pub(crate) fn new(start: Link<K>, direction: Direction) -> Self {
        Self {
            upcoming: start,
            current: None,
            direction,
        }
    }

    /// Advances the walk and returns the next element.
    ///
    /// The element after the returned one is captured immediately, so the
    /// caller may remove the returned element before calling again.
    ///
    /// # Panics
    ///
    /// Panics if the captured element was unlinked since it was captured.
    /// Following its links would revisit it forever.
    #[allow(clippy::should_implement_trait)]
    pub fn next<N: NodeSource<K>>(&mut self, nodes: &N) -> Option<K> {
        match self.upcoming {
            Link::Head => {
                self.current = None;
                None
            }
            Link::Node(key) => {
                let node = nodes.node(key);
                assert!(
                    node.is_linked(),
                    "walk advanced onto {:?}, which was unlinked during the previous visit",
                    key
                );
                self.upcoming = match self.direction {
                    Direction::Forward => node.next(),
                    Direction::Reverse => node.prev(),
                };
                self.current = Some(key);
                Some(key)
            }
        }
    }

    /// The element most recently yielded, `None` once exhausted.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// The element the next call will yield, if any.
    pub fn peek(&self) -> Option<K> {
        self.upcoming.key()
    }
}
