//! Reader for the spacetraveling blog, backed by the Prismic content API.
//!
//! [`pagination`] and [`reading_time`] hold the pure listing and
//! reading-time logic. [`client`] fetches posts, [`document`] decodes them,
//! [`paginator`] drives "load more" for one listing session and [`render`]
//! turns rich text into escaped markup.

pub mod client;
pub mod config;
pub mod document;
pub mod models;
pub mod pagination;
pub mod paginator;
pub mod reading_time;
pub mod render;
pub mod viewer;
