//! Repositories wrapping sea-orm queries.

pub mod caption;
pub mod caption_vote;
pub mod image;
pub mod profile;

pub use caption::CaptionRepository;
pub use caption_vote::CaptionVoteRepository;
pub use image::{ImageFilter, ImageRepository};
pub use profile::ProfileRepository;
