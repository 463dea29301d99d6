//! # Intrusive Lists
//!
//! Circular doubly-linked lists with an embedded sentinel, backing every
//! live-entity roster in the world: the global character, object, room,
//! area and session rosters, room people and contents, inventories,
//! container contents and affect lists.
//!
//! The list head holds the sentinel links and an element count. Nodes are
//! embedded by value in the entities themselves and reached through a
//! [`NodeSource`], so pushing and removing are O(1), never allocate, and
//! never take ownership of an entity.
//!
//! All preconditions (pushing a node that is already linked, removing a
//! node that is not a member) are logic errors. They are checked with
//! debug assertions, and [`List::audit`] verifies the whole structure for
//! tests and integrity sweeps.

pub mod iter;
pub mod node;
pub mod source;

pub use iter::*;
pub use node::*;
pub use source::*;

use std::fmt::Debug;

/// Structural damage found by [`List::audit`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// The recorded count disagrees with the reachable element count
    #[error("list records {recorded} elements but {reachable} are reachable")]
    CountMismatch { recorded: usize, reachable: usize },

    /// Following `next` never returned to the sentinel
    #[error("list does not return to its sentinel within {limit} steps")]
    Unterminated { limit: usize },

    /// A member's `prev` does not name the element before it
    #[error("back link of {0} does not match its predecessor")]
    BrokenBackLink(String),

    /// A reachable node reports itself unlinked
    #[error("member {0} reports itself unlinked")]
    SelfLinkedMember(String),
}

/// A list head: sentinel links plus the element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<K> {
    next: Link<K>,
    prev: Link<K>,
    count: usize,
}

impl<K: Copy + Eq + Debug> Default for List<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Debug> List<K> {
    /// Creates an empty list.
    ///
    /// # Examples
    ///
    /// ```
    /// use mudcore::list::List;
    ///
    /// let list: List<u32> = List::new();
    /// assert!(list.is_empty());
    /// assert_eq!(list.len(), 0);
    /// assert_eq!(list.first(), None);
    /// assert_eq!(list.last(), None);
    /// ```
    pub fn new() -> Self {
        Self {
            next: Link::Head,
            prev: Link::Head,
            count: 0,
        }
    }

    /// Number of elements. O(1).
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the list has no elements. O(1).
    pub fn is_empty(&self) -> bool {
        self.next == Link::Head
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<K> {
        self.next.key()
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<K> {
        self.prev.key()
    }

    /// Inserts an unlinked node at the front.
    pub fn push_front<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, key: K) {
        let next = self.next;
        self.insert_between(nodes, key, Link::Head, next);
    }

    /// Inserts an unlinked node at the back.
    pub fn push_back<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, key: K) {
        let prev = self.prev;
        self.insert_between(nodes, key, prev, Link::Head);
    }

    /// Inserts an unlinked node immediately before the member `before`.
    pub fn insert_before<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, key: K, before: K) {
        let prev = {
            let anchor = nodes.node(before);
            debug_assert!(anchor.is_linked(), "insert_before: {:?} is not a member", before);
            anchor.prev()
        };
        self.insert_between(nodes, key, prev, Link::Node(before));
    }

    /// Detaches a member, splices its neighbours together and resets the
    /// node to the unlinked state.
    pub fn remove<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, key: K) {
        let (prev, next) = {
            let node = nodes.node(key);
            debug_assert!(node.is_linked(), "remove: {:?} is not linked", key);
            (node.prev(), node.next())
        };
        debug_assert!(self.count > 0, "remove: {:?} from an empty list", key);

        self.set_next(nodes, prev, next);
        self.set_prev(nodes, next, prev);
        nodes.node_mut(key).reset();
        self.count -= 1;
    }

    /// Forward traversal. The list and nodes stay borrowed for the loop.
    pub fn iter<N: NodeSource<K>>(&self, nodes: N) -> Iter<'_, K, N> {
        Iter::new(nodes, self.next, Direction::Forward)
    }

    /// Reverse traversal. The list and nodes stay borrowed for the loop.
    pub fn iter_rev<N: NodeSource<K>>(&self, nodes: N) -> Iter<'_, K, N> {
        Iter::new(nodes, self.prev, Direction::Reverse)
    }

    /// Forward traversal that tolerates removal of the yielded element.
    pub fn walk(&self) -> Walk<K> {
        Walk::new(self.next, Direction::Forward)
    }

    /// Reverse traversal that tolerates removal of the yielded element.
    pub fn walk_rev(&self) -> Walk<K> {
        Walk::new(self.prev, Direction::Reverse)
    }

    /// Returns true if `key` is a member of this list. O(n).
    pub fn contains<N: NodeSource<K>>(&self, nodes: &N, key: K) -> bool {
        self.iter(nodes).any(|member| member == key)
    }

    /// Collects the keys in forward order.
    pub fn keys<N: NodeSource<K>>(&self, nodes: &N) -> Vec<K> {
        self.iter(nodes).collect()
    }

    /// Checks every structural invariant: each reachable node is linked,
    /// back links mirror forward links, the walk terminates at the
    /// sentinel, and the count matches what is reachable.
    pub fn audit<N: NodeSource<K>>(&self, nodes: &N) -> Result<(), Corruption> {
        let limit = self.count + 1;
        let mut previous = Link::Head;
        let mut position = self.next;
        let mut reachable = 0;

        while let Link::Node(key) = position {
            if reachable >= limit {
                return Err(Corruption::Unterminated { limit });
            }
            let node = nodes.node(key);
            if !node.is_linked() {
                return Err(Corruption::SelfLinkedMember(format!("{:?}", key)));
            }
            if node.prev() != previous {
                return Err(Corruption::BrokenBackLink(format!("{:?}", key)));
            }
            reachable += 1;
            previous = position;
            position = node.next();
        }

        if self.prev != previous {
            return Err(Corruption::BrokenBackLink("sentinel".to_string()));
        }
        if reachable != self.count {
            return Err(Corruption::CountMismatch {
                recorded: self.count,
                reachable,
            });
        }
        Ok(())
    }

    fn insert_between<N: NodeSourceMut<K>>(
        &mut self,
        nodes: &mut N,
        key: K,
        prev: Link<K>,
        next: Link<K>,
    ) {
        debug_assert!(
            !nodes.node(key).is_linked(),
            "insert: {:?} is already linked",
            key
        );

        self.set_prev(nodes, next, Link::Node(key));
        {
            let node = nodes.node_mut(key);
            node.next = next;
            node.prev = prev;
        }
        self.set_next(nodes, prev, Link::Node(key));
        self.count += 1;
    }

    fn set_next<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, at: Link<K>, to: Link<K>) {
        match at {
            Link::Head => self.next = to,
            Link::Node(key) => nodes.node_mut(key).next = to,
        }
    }

    fn set_prev<N: NodeSourceMut<K>>(&mut self, nodes: &mut N, at: Link<K>, to: Link<K>) {
        match at {
            Link::Head => self.prev = to,
            Link::Node(key) => nodes.node_mut(key).prev = to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{new_key_type, SlotMap};

    new_key_type! {
        struct ItemId;
    }

    struct Item {
        value: u32,
        node: ListNode<ItemId>,
        other: ListNode<ItemId>,
    }

    crate::list_member!(Primary: Item, ItemId, node);
    crate::list_member!(Secondary: Item, ItemId, other);

    fn spawn(items: &mut SlotMap<ItemId, Item>, value: u32) -> ItemId {
        items.insert_with_key(|id| Item {
            value,
            node: ListNode::new(id),
            other: ListNode::new(id),
        })
    }

    fn values(list: &List<ItemId>, items: &SlotMap<ItemId, Item>) -> Vec<u32> {
        list.iter(&Primary::within(items))
            .map(|id| items[id].value)
            .collect()
    }

    fn filled(
        items: &mut SlotMap<ItemId, Item>,
        range: std::ops::RangeInclusive<u32>,
    ) -> (List<ItemId>, Vec<ItemId>) {
        let mut list = List::new();
        let mut ids = Vec::new();
        for value in range {
            let id = spawn(items, value);
            list.push_back(&mut Primary::within_mut(items), id);
            ids.push(id);
        }
        (list, ids)
    }

    #[test]
    fn test_new_list_is_empty() {
        let list: List<ItemId> = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
    }

    #[test]
    fn test_link_round_trip() {
        let mut items = SlotMap::with_key();
        let id = spawn(&mut items, 1);
        assert!(!items[id].node.is_linked());

        let mut list = List::new();
        list.push_back(&mut Primary::within_mut(&mut items), id);
        assert!(items[id].node.is_linked());
        assert_eq!(list.first(), Some(id));
        assert_eq!(list.last(), Some(id));

        list.remove(&mut Primary::within_mut(&mut items), id);
        assert!(!items[id].node.is_linked());
        assert!(list.is_empty());
    }

    #[test]
    fn test_push_back_preserves_order() {
        let mut items = SlotMap::with_key();
        let (list, _) = filled(&mut items, 1..=3);
        assert_eq!(values(&list, &items), vec![1, 2, 3]);
    }

    #[test]
    fn test_push_front_reverses_order() {
        let mut items = SlotMap::with_key();
        let mut list = List::new();
        for value in 1..=3 {
            let id = spawn(&mut items, value);
            list.push_front(&mut Primary::within_mut(&mut items), id);
        }
        assert_eq!(values(&list, &items), vec![3, 2, 1]);
    }

    #[test]
    fn test_remove_middle() {
        let mut items = SlotMap::with_key();
        let (mut list, ids) = filled(&mut items, 1..=3);

        list.remove(&mut Primary::within_mut(&mut items), ids[1]);
        assert_eq!(values(&list, &items), vec![1, 3]);
        assert_eq!(list.len(), 2);
        assert!(!items[ids[1]].node.is_linked());
        assert!(list.audit(&Primary::within(&items)).is_ok());
    }

    #[test]
    fn test_insert_before() {
        let mut items = SlotMap::with_key();
        let (mut list, ids) = filled(&mut items, 1..=2);
        let extra = spawn(&mut items, 9);

        list.insert_before(&mut Primary::within_mut(&mut items), extra, ids[1]);
        assert_eq!(values(&list, &items), vec![1, 9, 2]);

        let front = spawn(&mut items, 0);
        list.insert_before(&mut Primary::within_mut(&mut items), front, ids[0]);
        assert_eq!(values(&list, &items), vec![0, 1, 9, 2]);
        assert_eq!(list.first(), Some(front));
        assert!(list.audit(&Primary::within(&items)).is_ok());
    }

    #[test]
    fn test_reverse_iteration() {
        let mut items = SlotMap::with_key();
        let (list, _) = filled(&mut items, 1..=4);
        let reversed: Vec<u32> = list
            .iter_rev(&Primary::within(&items))
            .map(|id| items[id].value)
            .collect();
        assert_eq!(reversed, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_safe_walk_removes_even_values() {
        let mut items = SlotMap::with_key();
        let (mut list, ids) = filled(&mut items, 1..=5);

        let mut walk = list.walk();
        while let Some(id) = walk.next(&Primary::within(&items)) {
            if items[id].value % 2 == 0 {
                list.remove(&mut Primary::within_mut(&mut items), id);
            }
        }

        assert_eq!(values(&list, &items), vec![1, 3, 5]);
        assert_eq!(list.len(), 3);
        assert!(!items[ids[1]].node.is_linked());
        assert!(!items[ids[3]].node.is_linked());
        assert_eq!(walk.current(), None);
    }

    #[test]
    fn test_safe_walk_removing_everything_terminates() {
        let mut items = SlotMap::with_key();
        let (mut list, _) = filled(&mut items, 1..=5);

        let mut visited = Vec::new();
        let mut walk = list.walk();
        while let Some(id) = walk.next(&Primary::within(&items)) {
            visited.push(items[id].value);
            list.remove(&mut Primary::within_mut(&mut items), id);
        }

        assert_eq!(visited, vec![1, 2, 3, 4, 5]);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_safe_walk_tolerates_destroying_current() {
        let mut items = SlotMap::with_key();
        let (mut list, _) = filled(&mut items, 1..=3);

        let mut walk = list.walk_rev();
        while let Some(id) = walk.next(&Primary::within(&items)) {
            list.remove(&mut Primary::within_mut(&mut items), id);
            items.remove(id);
        }
        assert!(list.is_empty());
        assert!(items.is_empty());
    }

    #[test]
    #[should_panic(expected = "unlinked during the previous visit")]
    fn test_safe_walk_rejects_removing_upcoming() {
        let mut items = SlotMap::with_key();
        let (mut list, ids) = filled(&mut items, 1..=3);

        let mut walk = list.walk();
        while let Some(id) = walk.next(&Primary::within(&items)) {
            if id == ids[0] {
                list.remove(&mut Primary::within_mut(&mut items), ids[1]);
            }
        }
    }

    #[test]
    fn test_iteration_terminal_value() {
        let mut items = SlotMap::with_key();
        let empty: List<ItemId> = List::new();
        let source = Primary::within(&items);
        let mut iter = empty.iter(&source);
        for _ in iter.by_ref() {}
        assert_eq!(iter.current(), None);

        let (list, ids) = filled(&mut items, 1..=3);
        let source = Primary::within(&items);

        let mut exhausted = list.iter(&source);
        for _ in exhausted.by_ref() {}
        assert_eq!(exhausted.current(), None);

        let mut stopped = list.iter(&source);
        for id in stopped.by_ref() {
            if items[id].value == 2 {
                break;
            }
        }
        assert_eq!(stopped.current(), Some(ids[1]));

        let mut walk = list.walk();
        while let Some(id) = walk.next(&source) {
            if items[id].value == 3 {
                break;
            }
        }
        assert_eq!(walk.current(), Some(ids[2]));
        assert_eq!(walk.next(&source), None);
        assert_eq!(walk.current(), None);
    }

    #[test]
    fn test_one_entity_in_two_lists() {
        let mut items = SlotMap::with_key();
        let (mut primary, ids) = filled(&mut items, 1..=3);
        let mut secondary = List::new();
        secondary.push_back(&mut Secondary::within_mut(&mut items), ids[2]);
        secondary.push_back(&mut Secondary::within_mut(&mut items), ids[0]);

        primary.remove(&mut Primary::within_mut(&mut items), ids[0]);
        assert!(items[ids[0]].other.is_linked());
        assert_eq!(secondary.keys(&Secondary::within(&items)), vec![ids[2], ids[0]]);
        assert!(secondary.contains(&Secondary::within(&items), ids[0]));
        assert!(!primary.contains(&Primary::within(&items), ids[0]));
        assert!(primary.audit(&Primary::within(&items)).is_ok());
        assert!(secondary.audit(&Secondary::within(&items)).is_ok());
    }

    #[test]
    fn test_audit_detects_count_mismatch() {
        let mut items = SlotMap::with_key();
        let (mut list, _) = filled(&mut items, 1..=2);
        list.count = 5;
        assert_eq!(
            list.audit(&Primary::within(&items)),
            Err(Corruption::CountMismatch {
                recorded: 5,
                reachable: 2
            })
        );
    }

    #[test]
    fn test_moving_between_lists() {
        let mut items = SlotMap::with_key();
        let (mut from, ids) = filled(&mut items, 1..=3);
        let mut to = List::new();

        let mut walk = from.walk();
        while let Some(id) = walk.next(&Primary::within(&items)) {
            if items[id].value != 2 {
                from.remove(&mut Primary::within_mut(&mut items), id);
                to.push_front(&mut Primary::within_mut(&mut items), id);
            }
        }

        assert_eq!(values(&from, &items), vec![2]);
        assert_eq!(values(&to, &items), vec![3, 1]);
        assert_eq!(walk.current(), None);
        assert_eq!(to.first(), Some(ids[2]));
    }
}
