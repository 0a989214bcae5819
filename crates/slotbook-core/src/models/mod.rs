//! Data models for the booking service.
//!
//! - `User`, `Role`: the authenticated profile stored with the session
//! - `Slot`: a bookable interval published by the server
//! - `Booking`, `BookingTiming`: a user's reservation of a slot
//! - `AllBookingsResponse`, `Pagination`: the admin listing envelope

pub mod booking;
pub mod slot;
pub mod user;

pub use booking::{AllBookingsResponse, Booking, BookingTiming, BookingUser, Pagination};
pub use slot::Slot;
pub use user::{Role, User};

use serde::{Deserialize, Deserializer};

/// Accept an identifier sent as either a JSON string or a JSON number.
pub(crate) fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
