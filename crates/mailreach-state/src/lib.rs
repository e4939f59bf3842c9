//! MailReach State - client-side state store for the dashboard
//!
//! One slice per domain (auth, SMTP accounts, recipients, campaigns, single
//! emails, templates) held in a shared [`Store`]. Actions run the matching
//! service call and merge the normalized result into the slice, tracking each
//! call with an [`AsyncOp`].

pub mod async_op;
pub mod auth;
pub mod cache;
pub mod campaigns;
pub mod query;
pub mod recipients;
pub mod single_emails;
pub mod slice;
pub mod smtp;
pub mod store;
pub mod templates;
pub mod view;

pub use async_op::{AsyncOp, OpMode, OpStatus, Ticket};
pub use cache::EntityCache;
pub use query::ListQuery;
pub use single_emails::BulkOutcome;
pub use slice::ListSlice;
pub use store::{AppState, Store};
