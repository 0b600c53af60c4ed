//! Lifecycle effects invoked explicitly by the write path.

pub mod aggregates;
pub mod cascade;
pub mod geocode;
pub mod mailer;
pub mod slug;

pub use geocode::{Geocoder, Location, OfflineGeocoder};
pub use mailer::{LogMailer, Mailer, Message};
pub use slug::slugify;
