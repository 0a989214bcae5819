use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Slot;

/// Whether a booking's slot still lies ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTiming {
    Upcoming,
    Past,
}

impl std::fmt::Display for BookingTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingTiming::Upcoming => write!(f, "Upcoming"),
            BookingTiming::Past => write!(f, "Past"),
        }
    }
}

/// The patient a booking belongs to, as embedded in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(alias = "_id", deserialize_with = "super::id_from_any")]
    pub id: String,
    pub slot: Slot,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<BookingUser>,
}

impl Booking {
    /// Classify against the given clock reading. A slot starting exactly
    /// now is no longer upcoming.
    pub fn timing(&self, now: DateTime<Utc>) -> BookingTiming {
        if self.slot.start_time > now {
            BookingTiming::Upcoming
        } else {
            BookingTiming::Past
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.timing(now) == BookingTiming::Upcoming
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages", alias = "total_pages")]
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Response of `GET /all-bookings`.
///
/// Current servers wrap the rows in a pagination envelope; older ones
/// answer with a bare array. Both shapes are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AllBookingsResponse {
    Paginated {
        bookings: Vec<Booking>,
        pagination: Pagination,
    },
    Bare(Vec<Booking>),
}

impl AllBookingsResponse {
    pub fn bookings(&self) -> &[Booking] {
        match self {
            AllBookingsResponse::Paginated { bookings, .. } => bookings,
            AllBookingsResponse::Bare(bookings) => bookings,
        }
    }

    /// Pagination for display. A bare array is treated as one full page.
    pub fn pagination(&self) -> Pagination {
        match self {
            AllBookingsResponse::Paginated { pagination, .. } => *pagination,
            AllBookingsResponse::Bare(bookings) => Pagination {
                page: 1,
                limit: bookings.len() as u32,
                total: bookings.len() as u64,
                total_pages: 1,
            },
        }
    }
}
