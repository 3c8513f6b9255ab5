//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Records kept in a [`crate::RecordStore`] implement this so the store can
/// key them without the caller repeating the id.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
