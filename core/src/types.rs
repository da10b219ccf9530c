//! Domain DTOs and the response envelope for the blog API.
//!
//! # Design
//! These types mirror the server's JSON (camelCase field names) but are
//! defined independently from the mock-server crate; integration tests catch
//! schema drift between the two.
//!
//! Every response body is a `ResponseEnvelope<T>`. Callers decode it into a
//! plain `Result` with `into_result`, so nothing outside this module compares
//! raw envelope codes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// Envelope code the server uses for success.
pub const SUCCESS_CODE: i64 = 0;

/// The `{code, data, message}` wrapper carried by every server response.
///
/// `data` is `None` when the server sends `null` or omits it; `message`
/// defaults to the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub code: i64,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            data: Some(data),
            message: "ok".to_string(),
        }
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Decode the envelope into its payload, or `ApiError::Domain` carrying
    /// the server's code and message.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ApiError::Domain {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// A user as returned by the login and current-user endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_img: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub thumb_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub create_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_time: String,
}

/// A blog post annotated with its author and the requesting user's like
/// relation (`BlogVO` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    #[serde(flatten)]
    pub blog: Blog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Anonymous readers get `null` from the server, which decodes as `false`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_thumb: bool,
}

impl BlogView {
    pub fn id(&self) -> i64 {
        self.blog.id
    }

    pub fn thumb_count(&self) -> u32 {
        self.blog.thumb_count
    }
}

/// Request payload for `/thumb/do` and `/thumb/undo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbRequest {
    pub blog_id: i64,
}

/// Values that can be coerced to an integer id before transmission.
///
/// Integers convert when they fit in `i64`, floats when they are finite and
/// integral, strings when they parse as a decimal integer after trimming.
pub trait IntoId {
    fn into_id(self) -> Option<i64>;
}

impl IntoId for i64 {
    fn into_id(self) -> Option<i64> {
        Some(self)
    }
}

impl IntoId for i32 {
    fn into_id(self) -> Option<i64> {
        Some(i64::from(self))
    }
}

impl IntoId for u32 {
    fn into_id(self) -> Option<i64> {
        Some(i64::from(self))
    }
}

impl IntoId for u64 {
    fn into_id(self) -> Option<i64> {
        i64::try_from(self).ok()
    }
}

impl IntoId for usize {
    fn into_id(self) -> Option<i64> {
        i64::try_from(self).ok()
    }
}

impl IntoId for f64 {
    fn into_id(self) -> Option<i64> {
        let in_range = self >= i64::MIN as f64 && self < i64::MAX as f64;
        if self.is_finite() && self.fract() == 0.0 && in_range {
            Some(self as i64)
        } else {
            None
        }
    }
}

impl IntoId for &str {
    fn into_id(self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl IntoId for &String {
    fn into_id(self) -> Option<i64> {
        self.as_str().into_id()
    }
}

impl IntoId for String {
    fn into_id(self) -> Option<i64> {
        self.as_str().into_id()
    }
}

fn null_as_default<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Default + Deserialize<'de>,
{
    Ok(Option::<V>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_view_decodes_camel_case_fields() {
        let raw = r#"{
            "id": 1, "userId": 3, "title": "Hello", "coverImg": "c.png",
            "content": "body", "thumbCount": 5,
            "createTime": "2025-04-17 18:00:00", "updateTime": "2025-04-17 18:05:00",
            "username": "alice", "userAvatar": "a.png", "hasThumb": true
        }"#;
        let view: BlogView = serde_json::from_str(raw).unwrap();
        assert_eq!(view.id(), 1);
        assert_eq!(view.blog.user_id, 3);
        assert_eq!(view.blog.cover_img.as_deref(), Some("c.png"));
        assert_eq!(view.thumb_count(), 5);
        assert_eq!(view.username.as_deref(), Some("alice"));
        assert!(view.has_thumb);
    }

    #[test]
    fn blog_view_null_has_thumb_is_false() {
        let raw = r#"{"id":2,"title":"t","thumbCount":0,"createTime":"x","hasThumb":null}"#;
        let view: BlogView = serde_json::from_str(raw).unwrap();
        assert!(!view.has_thumb);
        assert!(view.username.is_none());
        assert_eq!(view.blog.content, "");
    }

    #[test]
    fn envelope_missing_data_and_message() {
        let env: ResponseEnvelope<User> = serde_json::from_str(r#"{"code":0}"#).unwrap();
        assert!(env.is_success());
        assert!(env.data.is_none());
        assert_eq!(env.message, "");
    }

    #[test]
    fn envelope_null_message_decodes_empty() {
        let env: ResponseEnvelope<bool> =
            serde_json::from_str(r#"{"code":40100,"data":null,"message":null}"#).unwrap();
        assert_eq!(env.message, "");
        assert!(!env.is_success());
    }

    #[test]
    fn into_result_maps_non_zero_code_to_domain_error() {
        let env: ResponseEnvelope<User> = ResponseEnvelope::failure(1, "bad");
        let err = env.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Domain { code: 1, .. }));
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn into_result_passes_payload_through() {
        let env = ResponseEnvelope::success(true);
        assert_eq!(env.into_result().unwrap(), Some(true));
    }

    #[test]
    fn thumb_request_serializes_blog_id() {
        let json = serde_json::to_value(ThumbRequest { blog_id: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({ "blogId": 7 }));
    }

    #[test]
    fn id_coercion() {
        assert_eq!(42i64.into_id(), Some(42));
        assert_eq!(7u32.into_id(), Some(7));
        assert_eq!(u64::MAX.into_id(), None);
        assert_eq!(3.0f64.into_id(), Some(3));
        assert_eq!(3.5f64.into_id(), None);
        assert_eq!(f64::NAN.into_id(), None);
        assert_eq!(f64::INFINITY.into_id(), None);
        assert_eq!(" 12 ".into_id(), Some(12));
        assert_eq!("abc".into_id(), None);
        assert_eq!(String::from("-4").into_id(), Some(-4));
    }
}
