//! KidQuest Protocol - Wire contracts for the progress and content API
//!
//! This crate contains the types exchanged between the engine and the backend:
//! - Request bodies (`StartQuestRequest`, `UpdateProgressRequest`)
//! - Error bodies (`ApiErrorResponse`)
//! - Route builders for every endpoint the engine calls
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, uuid and the domain vocabulary
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Raw ids in request bodies** - use `uuid::Uuid`, as the backend does

pub mod requests;
pub mod responses;
pub mod routes;

pub use requests::{StartQuestRequest, UpdateProgressRequest};
pub use responses::ApiErrorResponse;
