//! Blog state: the post list, the post being viewed, and recently viewed ids.
//!
//! # Design
//! Detail fetches are numbered. `begin_detail` issues a `DetailTicket` and
//! `finish_detail` applies a response only when its ticket is the latest one
//! issued, so overlapping detail requests cannot leave an older post in the
//! "current" slot. `fetch_detail` runs both halves back to back.
//!
//! Recently viewed ids are the only persisted part. They are written once,
//! at the end of a successful detail fetch.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::api::blog_id;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport, UreqTransport};
use crate::storage::{load_json, save_json, KvStore};
use crate::types::{BlogView, IntoId, ResponseEnvelope};

pub const RECENT_VIEWED_KEY: &str = "recent-viewed-blogs";
pub const RECENT_VIEWED_LIMIT: usize = 10;

/// Handle for one in-flight detail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    pub seq: u64,
    pub blog_id: i64,
}

pub struct BlogStore<T = UreqTransport> {
    client: Arc<ApiClient<T>>,
    storage: Arc<dyn KvStore>,
    blogs: Vec<BlogView>,
    current: Option<BlogView>,
    loading: bool,
    recent_viewed: Vec<i64>,
    detail_seq: u64,
}

impl<T: Transport> BlogStore<T> {
    /// Create the store and rehydrate recently viewed ids from `storage`.
    pub fn new(client: Arc<ApiClient<T>>, storage: Arc<dyn KvStore>) -> Self {
        let mut recent_viewed: Vec<i64> = match load_json(storage.as_ref(), RECENT_VIEWED_KEY) {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse recently viewed blogs");
                Vec::new()
            }
        };
        recent_viewed.truncate(RECENT_VIEWED_LIMIT);

        Self {
            client,
            storage,
            blogs: Vec::new(),
            current: None,
            loading: false,
            recent_viewed,
            detail_seq: 0,
        }
    }

    pub fn blogs(&self) -> &[BlogView] {
        &self.blogs
    }

    pub fn current(&self) -> Option<&BlogView> {
        self.current.as_ref()
    }

    /// Whether a detail request started with `begin_detail` is still
    /// awaiting `finish_detail`. Blocking calls report through the client's
    /// `LoadingSignal` instead.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Most recent first.
    pub fn recent_viewed(&self) -> &[i64] {
        &self.recent_viewed
    }

    /// Posts by creation time, newest first. Stored order is left alone.
    ///
    /// Times that don't parse sort after all parsed ones, in stored order.
    pub fn sorted_by_create_time(&self) -> Vec<&BlogView> {
        let mut keyed: Vec<(Option<DateTime<Utc>>, &BlogView)> = self
            .blogs
            .iter()
            .map(|view| (parse_create_time(&view.blog.create_time), view))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        keyed.into_iter().map(|(_, view)| view).collect()
    }

    /// Replace the list with the server's. On any failure the previous list
    /// is kept.
    pub fn fetch_list(&mut self) -> Result<&[BlogView], ApiError> {
        let envelope = self.client.blogs().list().map_err(|e| {
            tracing::error!(error = %e, "failed to fetch blog list");
            e
        })?;
        match envelope.into_result() {
            Ok(data) => {
                self.blogs = data.unwrap_or_default();
                tracing::debug!(count = self.blogs.len(), "blog list updated");
                Ok(&self.blogs)
            }
            Err(e) => {
                let e = e.with_default_message("failed to fetch blog list");
                tracing::error!(error = %e, "blog list request rejected");
                Err(e)
            }
        }
    }

    /// Fetch one post into the current slot. Any failure, including a
    /// non-numeric id, clears the slot.
    pub fn fetch_detail(&mut self, id: impl IntoId) -> Result<&BlogView, ApiError> {
        let (ticket, request) = match self.begin_detail(id) {
            Ok(started) => started,
            Err(e) => {
                tracing::error!(error = %e, "invalid blog detail request");
                self.current = None;
                return Err(e);
            }
        };
        let outcome = self.client.execute::<BlogView>(request);
        self.finish_detail(ticket, outcome)
    }

    /// Validate `id`, issue a new ticket and build the request. The caller
    /// executes it and hands the outcome to `finish_detail`.
    pub fn begin_detail(&mut self, id: impl IntoId) -> Result<(DetailTicket, HttpRequest), ApiError> {
        let blog_id = blog_id(id)?;
        let request = self.client.blogs().build_detail(blog_id)?;
        self.detail_seq += 1;
        self.loading = true;
        tracing::debug!(blog_id, seq = self.detail_seq, "fetching blog detail");
        Ok((
            DetailTicket {
                seq: self.detail_seq,
                blog_id,
            },
            request,
        ))
    }

    /// Apply a detail outcome. Outcomes for superseded tickets are dropped
    /// with `ApiError::Stale` and leave state untouched.
    pub fn finish_detail(
        &mut self,
        ticket: DetailTicket,
        outcome: Result<ResponseEnvelope<BlogView>, ApiError>,
    ) -> Result<&BlogView, ApiError> {
        if ticket.seq != self.detail_seq {
            tracing::debug!(seq = ticket.seq, latest = self.detail_seq, "dropping stale blog detail");
            return Err(ApiError::Stale {
                seq: ticket.seq,
                latest: self.detail_seq,
            });
        }
        self.loading = false;

        let view = outcome.and_then(|envelope| match envelope.into_result() {
            Ok(Some(view)) => Ok(view),
            Ok(None) => Err(ApiError::MissingData("failed to fetch blog detail".to_string())),
            Err(e) => Err(e.with_default_message("failed to fetch blog detail")),
        });
        match view {
            Ok(view) => {
                self.push_recent(ticket.blog_id);
                self.save_recent();
                Ok(&*self.current.insert(view))
            }
            Err(e) => {
                tracing::error!(blog_id = ticket.blog_id, error = %e, "failed to fetch blog detail");
                self.current = None;
                Err(e)
            }
        }
    }

    /// Like a post and, once the server confirms, apply the optimistic
    /// update. Returns the server's confirmation flag.
    pub fn thumb(&mut self, id: impl IntoId) -> Result<bool, ApiError> {
        self.toggle_thumb(id, true)
    }

    pub fn unthumb(&mut self, id: impl IntoId) -> Result<bool, ApiError> {
        self.toggle_thumb(id, false)
    }

    fn toggle_thumb(&mut self, id: impl IntoId, has_thumb: bool) -> Result<bool, ApiError> {
        let blog_id = blog_id(id)?;
        let thumbs = self.client.thumbs();
        let envelope = if has_thumb {
            thumbs.do_thumb(blog_id)?
        } else {
            thumbs.undo_thumb(blog_id)?
        };
        let confirmed = envelope
            .into_result()
            .map_err(|e| e.with_default_message("thumb request failed"))?
            .unwrap_or(false);
        if confirmed {
            self.apply_thumb_status(blog_id, has_thumb);
        }
        Ok(confirmed)
    }

    /// Set the like flag on every loaded copy of post `id` and move its count
    /// by one (never below zero). Copies already in the requested state are
    /// left alone. Returns whether anything changed.
    pub fn apply_thumb_status(&mut self, id: i64, has_thumb: bool) -> bool {
        let mut changed = false;
        if let Some(view) = self.blogs.iter_mut().find(|b| b.id() == id) {
            changed |= apply_to(view, has_thumb);
        } else {
            tracing::warn!(blog_id = id, "blog not in list, skipping thumb update");
        }
        if let Some(view) = self.current.as_mut().filter(|b| b.id() == id) {
            changed |= apply_to(view, has_thumb);
        }
        changed
    }

    fn push_recent(&mut self, id: i64) {
        self.recent_viewed.retain(|&seen| seen != id);
        self.recent_viewed.insert(0, id);
        self.recent_viewed.truncate(RECENT_VIEWED_LIMIT);
    }

    fn save_recent(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), RECENT_VIEWED_KEY, &self.recent_viewed) {
            tracing::warn!(error = %e, "failed to persist recently viewed blogs");
        }
    }
}

/// RFC 3339 with an offset, or a naive `yyyy-MM-dd HH:mm:ss` (space or `T`)
/// read as UTC.
fn parse_create_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

const NAIVE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn apply_to(view: &mut BlogView, has_thumb: bool) -> bool {
    if view.has_thumb == has_thumb {
        return false;
    }
    let before = view.blog.thumb_count;
    view.has_thumb = has_thumb;
    view.blog.thumb_count = if has_thumb {
        before.saturating_add(1)
    } else {
        before.saturating_sub(1)
    };
    tracing::debug!(
        blog_id = view.id(),
        before,
        after = view.blog.thumb_count,
        has_thumb,
        "thumb status applied"
    );
    true
}
