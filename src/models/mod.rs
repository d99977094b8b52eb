//! Data models for the developer portal.
//!
//! Entities as persisted, request bodies as accepted by the API and the view objects the
//! projector produces.

mod assignee;
mod component;
mod member;
mod outage_call;
mod page;
mod team;
mod views;

pub use assignee::*;
pub use component::*;
pub use member::*;
pub use outage_call::*;
pub use page::*;
pub use team::*;
pub use views::*;
