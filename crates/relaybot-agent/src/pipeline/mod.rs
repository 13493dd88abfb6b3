//! Inbound message pipeline shared by every chat adapter.

pub mod chunk;
pub mod context;
pub mod router;
pub mod slash;

pub use context::{DeliveryError, Messenger, Outbound, TextFormat};
pub use router::{AnnouncementError, AnnouncementReport, SessionRouter};
