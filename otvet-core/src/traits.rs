//! Small traits shared across the workspace.

/// Items that carry the service's numeric object identifier.
///
/// Every listable object (questions, answers, users, votes) exposes its id
/// through this trait so generic machinery can read it: the pagination
/// engine takes the anchor id from the first item of the first page, and
/// the live feed keeps its high-water mark as the newest id seen.
pub trait HasId {
    /// The service-side identifier of this item.
    fn id(&self) -> u64;
}

impl<T: HasId> HasId for &T {
    fn id(&self) -> u64 {
        (*self).id()
    }
}
