//! BloodBridge Core
//!
//! Storage-agnostic core types, traits, and error handling for the BloodBridge
//! blood-donation coordination backend.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Documents**: loosely-typed JSON records living in named collections
//!   (`users`, `requests`, `payments`)
//! - **Record store contract**: the [`DocumentStore`] trait with exact-match
//!   filters, offset pagination and a single numeric aggregate
//! - **Domain vocabulary**: roles, user status, the donation-request lifecycle,
//!   blood groups and the `Payment` record
//! - **Error Handling**: unified [`BloodBridgeError`] and [`Result`] types
//!
//! # Example
//!
//! ```rust
//! use bloodbridge_core::{fields, DonationStatus, Filter, Pagination};
//!
//! // Pending requests, second page of ten
//! let filter = Filter::new().eq(fields::DONATION_STATUS, DonationStatus::Pending.as_str());
//! let page = Pagination::new(Some(1), Some(10));
//!
//! assert_eq!(filter.len(), 1);
//! assert_eq!(page.offset(), 10);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use document::{fields, str_field, strip_fields, Collection, Document, DocumentId};
pub use error::{BloodBridgeError, Result};
pub use filter::{Filter, FindOptions, SortOrder};
pub use pagination::{Paged, Pagination};
pub use storage::{DeleteResult, DocumentStore, InsertOneResult, UpdateResult};
pub use types::{BloodGroup, DonationStatus, Payment, Role, UserStatus};
