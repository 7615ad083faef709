//! Course-file approval atoms.
//!
//! Each atom owns one kind of record: a `model` (what is stored and sent over
//! the wire), a `service` (domain logic that takes an [`store::ApprovalStore`]
//! as an argument) and, where it is exposed directly, an `http` module that
//! turns service results into Lambda responses.

pub mod access;
pub mod assignments;
pub mod audit;
pub mod errors;
pub mod responses;
pub mod store;
pub mod tasks;
pub mod users;

pub use access::Capabilities;
pub use errors::ApprovalError;
pub use store::{ApprovalStore, DynamoStore, MemoryStore, StoreError};
