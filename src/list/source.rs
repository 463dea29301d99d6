//! # Node Sources
//!
//! Lists never store entities. Every operation is handed a node source that
//! resolves a key to the embedded node the list threads through, which is
//! how one entity can sit in several independent lists at once.

use super::ListNode;
use slotmap::{Key, SlotMap};
use std::marker::PhantomData;

/// Read access to the nodes a list threads through.
///
/// Resolving a key that is not present is a broken invariant and panics.
pub trait NodeSource<K> {
    /// Returns the node embedded in the entity named by `key`.
    fn node(&self, key: K) -> &ListNode<K>;
}

/// Write access to the nodes a list threads through.
pub trait NodeSourceMut<K>: NodeSource<K> {
    /// Returns the node embedded in the entity named by `key`.
    fn node_mut(&mut self, key: K) -> &mut ListNode<K>;
}

impl<K, T: NodeSource<K> + ?Sized> NodeSource<K> for &T {
    fn node(&self, key: K) -> &ListNode<K> {
        (**self).node(key)
    }
}

impl<K, T: NodeSource<K> + ?Sized> NodeSource<K> for &mut T {
    fn node(&self, key: K) -> &ListNode<K> {
        (**self).node(key)
    }
}

impl<K, T: NodeSourceMut<K> + ?Sized> NodeSourceMut<K> for &mut T {
    fn node_mut(&mut self, key: K) -> &mut ListNode<K> {
        (**self).node_mut(key)
    }
}

/// Names one embedded node of entity type `E`.
///
/// A character carries a node for the global roster and another for its
/// room's roster; each gets its own `Member` marker. Markers are normally
/// declared with [`list_member!`](crate::list_member).
pub trait Member<E>: Sized {
    /// Arena key type of the entity.
    type Key: Key;

    fn node(entity: &E) -> &ListNode<Self::Key>;

    fn node_mut(entity: &mut E) -> &mut ListNode<Self::Key>;

    /// Views an arena through this member.
    fn within(slots: &SlotMap<Self::Key, E>) -> Embedded<'_, E, Self> {
        Embedded {
            slots,
            member: PhantomData,
        }
    }

    /// Views an arena mutably through this member.
    fn within_mut(slots: &mut SlotMap<Self::Key, E>) -> EmbeddedMut<'_, E, Self> {
        EmbeddedMut {
            slots,
            member: PhantomData,
        }
    }
}

/// Shared view of the `M` nodes inside a slot map of `E`.
pub struct Embedded<'a, E, M: Member<E>> {
    slots: &'a SlotMap<M::Key, E>,
    member: PhantomData<M>,
}

/// Exclusive view of the `M` nodes inside a slot map of `E`.
pub struct EmbeddedMut<'a, E, M: Member<E>> {
    slots: &'a mut SlotMap<M::Key, E>,
    member: PhantomData<M>,
}

impl<E, M: Member<E>> NodeSource<M::Key> for Embedded<'_, E, M> {
    fn node(&self, key: M::Key) -> &ListNode<M::Key> {
        M::node(&self.slots[key])
    }
}

impl<E, M: Member<E>> NodeSource<M::Key> for EmbeddedMut<'_, E, M> {
    fn node(&self, key: M::Key) -> &ListNode<M::Key> {
        M::node(&self.slots[key])
    }
}

impl<E, M: Member<E>> NodeSourceMut<M::Key> for EmbeddedMut<'_, E, M> {
    fn node_mut(&mut self, key: M::Key) -> &mut ListNode<M::Key> {
        M::node_mut(&mut self.slots[key])
    }
}

/// Declares a [`Member`] marker selecting one embedded node field.
///
/// ```
/// use mudcore::list::{ListNode, Member};
/// use mudcore::list_member;
/// use slotmap::{new_key_type, SlotMap};
///
/// new_key_type! { struct ItemId; }
///
/// struct Item {
///     node: ListNode<ItemId>,
/// }
///
/// list_member!(ItemNode: Item, ItemId, node);
///
/// let mut items: SlotMap<ItemId, Item> = SlotMap::with_key();
/// let id = items.insert_with_key(|id| Item { node: ListNode::new(id) });
/// assert!(!ItemNode::node(&items[id]).is_linked());
/// ```
#[macro_export]
macro_rules! list_member {
    ($(#[$meta:meta])* $vis:vis $marker:ident : $entity:ty, $key:ty, $field:ident) => {
        $(#[$meta])*
        $vis struct $marker;

        impl $crate::list::Member<$entity> for $marker {
            type Key = $key;

            fn node(entity: &$entity) -> &$crate::list::ListNode<$key> {
                &entity.$field
            }

            fn node_mut(entity: &mut $entity) -> &mut $crate::list::ListNode<$key> {
                &mut entity.$field
            }
        }
    };
}
