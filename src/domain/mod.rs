pub mod user;
pub mod department;
pub mod notice;
pub mod event;
pub mod media_file;
pub mod listing;

pub use user::*;
pub use department::*;
pub use notice::*;
pub use event::*;
pub use media_file::*;
pub use listing::{ListQuery, ListingParams, Page, SortOrder, PAGE_SIZE};

/// A record with a single owning user (publisher of a notice, organizer of an event).
pub trait Owned {
    fn owner_id(&self) -> i64;
}
