use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentId, IneligibleReason, ProductId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    NotFound(CommentId),

    #[error("Product not found {0}")]
    ProductNotFound(ProductId),

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Not eligible to review: {0:?}")]
    NotEligible(IneligibleReason),

    /// The request never got a proper answer from the server
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidRating(_) => StatusCode::BAD_REQUEST,
            Error::NotEligible(_) => StatusCode::FORBIDDEN,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(id) => json!({
                "message": "comment not found",
                "type": "not-found",
                "commentId": id,
            }),
            Error::ProductNotFound(id) => json!({
                "message": "product not found",
                "type": "product-not-found",
                "productId": id,
            }),
            Error::EmptyContent => json!({
                "message": "comment content is empty",
                "type": "empty-content",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidRating(r) => json!({
                "message": "rating must be between 1 and 5",
                "type": "invalid-rating",
                "rating": r,
            }),
            Error::NotEligible(reason) => json!({
                "message": reason.message(),
                "type": "not-eligible",
                "reason": reason,
            }),
            Error::Transport(msg) => json!({
                "message": msg,
                "type": "transport",
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        macro_rules! field {
            ($name:expr, $what:expr) => {
                serde_json::from_value(
                    data.get($name)
                        .cloned()
                        .ok_or_else(|| anyhow!("error is {} without a {}", $what, $name))?,
                )
                .with_context(|| format!("parsing {} of {} error", $name, $what))?
            };
        }
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(field!("commentId", "a missing comment")),
                "product-not-found" => {
                    Error::ProductNotFound(field!("productId", "a missing product"))
                }
                "empty-content" => Error::EmptyContent,
                "null-byte" => Error::NullByteInString(field!("string", "a null-byte-in-string")),
                "invalid-rating" => Error::InvalidRating(field!("rating", "an invalid rating")),
                "not-eligible" => Error::NotEligible(field!("reason", "a non-eligibility")),
                "transport" => Error::Transport(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
