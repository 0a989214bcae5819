//! Per-tab content rendering.

pub mod admin;
pub mod bookings;
pub mod slots;
