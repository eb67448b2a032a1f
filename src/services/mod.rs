pub mod auth;
pub mod booking;
pub mod chat;
pub mod dashboard;
pub mod likes;
pub mod profile;
pub mod reviews;
pub mod seed;
pub mod tutors;

pub use profile::{ImageStore, LocalImageStore};
