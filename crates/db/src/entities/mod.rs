//! Database entities.

pub mod caption;
pub mod caption_vote;
pub mod image;
pub mod profile;

pub use caption::Entity as Caption;
pub use caption_vote::Entity as CaptionVote;
pub use image::Entity as Image;
pub use profile::Entity as Profile;
