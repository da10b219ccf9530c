//! Data-access and state layer for the blog client.
//!
//! # Overview
//! `ApiClient` wraps one configured transport and turns every server reply
//! into a `ResponseEnvelope` or a normalized `ApiError`. The façades
//! (`BlogApi`, `ThumbApi`, `UserApi`) map one logical operation to one HTTP
//! call. `BlogStore` and `UserStore` hold the state a UI renders from and
//! persist what must survive a restart through a `KvStore`.
//!
//! # Design
//! - Requests and responses are plain data (host-does-IO pattern). Every
//!   operation has a `build_*` half, and `ApiClient::parse_envelope` is the
//!   matching parse half; `UreqTransport` executes the round trip by default.
//! - `LoadingSignal` is reference-counted: overlapping calls each hold a
//!   guard and the indicator clears when the last one drops.
//! - Envelopes are decoded with `into_result`, so stores never compare raw
//!   codes.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod blog_store;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod loading;
pub mod storage;
pub mod types;
pub mod user_store;

#[cfg(test)]
mod testing;

pub use api::{BlogApi, ThumbApi, UserApi};
pub use blog_store::{BlogStore, DetailTicket, RECENT_VIEWED_KEY, RECENT_VIEWED_LIMIT};
pub use client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use loading::{LoadingGuard, LoadingSignal, LoadingSnapshot, DEFAULT_LOADING_MESSAGE};
pub use storage::{FileStore, KvStore, MemoryStore, StorageError};
pub use types::{Blog, BlogView, IntoId, ResponseEnvelope, ThumbRequest, User};
pub use user_store::{UserStore, SESSION_KEY};
