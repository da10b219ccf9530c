//! Resource façades: one method per logical operation, one HTTP call each.
//!
//! Ids are coerced with `IntoId` before a request is built, so a value that
//! is not an integer never reaches the network. Nothing here retries or
//! caches; envelopes come back exactly as `ApiClient::execute` returns them.

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::types::{BlogView, IntoId, ResponseEnvelope, ThumbRequest, User};

pub const BLOG_LIST_PATH: &str = "/blog/list";
pub const BLOG_DETAIL_PATH: &str = "/blog/get";
pub const PING_PATH: &str = "/ping";
pub const THUMB_DO_PATH: &str = "/thumb/do";
pub const THUMB_UNDO_PATH: &str = "/thumb/undo";
pub const USER_LOGIN_PATH: &str = "/user/login";
pub const USER_CURRENT_PATH: &str = "/user/get/login";

pub(crate) fn blog_id(id: impl IntoId) -> Result<i64, ApiError> {
    id.into_id()
        .ok_or_else(|| ApiError::Validation("blog id must be numeric".to_string()))
}

pub(crate) fn user_id(id: impl IntoId) -> Result<i64, ApiError> {
    id.into_id()
        .ok_or_else(|| ApiError::Validation("user id must be numeric".to_string()))
}

pub struct BlogApi<'a, T> {
    client: &'a ApiClient<T>,
    options: RequestOptions,
}

impl<'a, T: Transport> BlogApi<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Apply `options` to every call made through this handle.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build_list(&self) -> HttpRequest {
        self.client.build_get(BLOG_LIST_PATH, &[])
    }

    /// The id travels as the `blogId` query parameter.
    pub fn build_detail(&self, id: impl IntoId) -> Result<HttpRequest, ApiError> {
        let id = blog_id(id)?;
        Ok(self.client.build_get(BLOG_DETAIL_PATH, &[("blogId", id.to_string())]))
    }

    pub fn list(&self) -> Result<ResponseEnvelope<Vec<BlogView>>, ApiError> {
        self.client.execute_with(self.build_list(), &self.options)
    }

    pub fn detail(&self, id: impl IntoId) -> Result<ResponseEnvelope<BlogView>, ApiError> {
        let request = self.build_detail(id)?;
        self.client.execute_with(request, &self.options)
    }

    /// Connectivity check; the server answers `"pong"`.
    pub fn ping(&self) -> Result<ResponseEnvelope<String>, ApiError> {
        self.client.get_with(PING_PATH, &[], &self.options)
    }
}

pub struct ThumbApi<'a, T> {
    client: &'a ApiClient<T>,
    options: RequestOptions,
}

impl<'a, T: Transport> ThumbApi<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Apply `options` to every call made through this handle.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build_do_thumb(&self, id: impl IntoId) -> Result<HttpRequest, ApiError> {
        let request = ThumbRequest { blog_id: blog_id(id)? };
        self.client.build_post(THUMB_DO_PATH, &request)
    }

    pub fn build_undo_thumb(&self, id: impl IntoId) -> Result<HttpRequest, ApiError> {
        let request = ThumbRequest { blog_id: blog_id(id)? };
        self.client.build_post(THUMB_UNDO_PATH, &request)
    }

    pub fn do_thumb(&self, id: impl IntoId) -> Result<ResponseEnvelope<bool>, ApiError> {
        let request = self.build_do_thumb(id)?;
        self.client.execute_with(request, &self.options)
    }

    pub fn undo_thumb(&self, id: impl IntoId) -> Result<ResponseEnvelope<bool>, ApiError> {
        let request = self.build_undo_thumb(id)?;
        self.client.execute_with(request, &self.options)
    }
}

pub struct UserApi<'a, T> {
    client: &'a ApiClient<T>,
    options: RequestOptions,
}

impl<'a, T: Transport> UserApi<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Apply `options` to every call made through this handle.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Login by id; the id travels as the `userId` query parameter.
    pub fn build_login(&self, id: impl IntoId) -> Result<HttpRequest, ApiError> {
        let id = user_id(id)?;
        Ok(self.client.build_get(USER_LOGIN_PATH, &[("userId", id.to_string())]))
    }

    pub fn build_current(&self) -> HttpRequest {
        self.client.build_get(USER_CURRENT_PATH, &[])
    }

    pub fn login(&self, id: impl IntoId) -> Result<ResponseEnvelope<User>, ApiError> {
        let request = self.build_login(id)?;
        self.client.execute_with(request, &self.options)
    }

    pub fn current(&self) -> Result<ResponseEnvelope<User>, ApiError> {
        self.client.execute_with(self.build_current(), &self.options)
    }
}
