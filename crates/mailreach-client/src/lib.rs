//! MailReach Client - REST access to the email-marketing backend
//!
//! This crate provides the authenticated HTTP wrapper, session token
//! persistence, the resource models, the response envelope normalizer and
//! one service per backend resource.

pub mod http;
pub mod models;
pub mod normalize;
pub mod services;
pub mod session;

pub use http::ApiClient;
pub use normalize::Page;
pub use services::{ListParams, NoFilter, Services};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
