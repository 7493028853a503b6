use crate::{Error, OrderId, ProductId, Time};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for CommentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<CommentId, Self::Err> {
        s.trim().parse().map(CommentId)
    }
}

/// A node of a product's reply tree. Reviews are the roots, and are the only
/// comments that may carry a rating.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "commentId")]
    pub id: CommentId,
    pub author_display_name: String,
    pub author_image_url: Option<String>,

    /// None for rating-only reviews
    pub content: Option<String>,
    pub created_at: Time,
    pub parent_id: Option<CommentId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub rating: Option<u8>,
}

impl Comment {
    pub fn is_review(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Whether `username` may edit or delete this comment. The server still
    /// enforces it, this only drives what gets offered.
    pub fn is_owned_by(&self, username: Option<&str>) -> bool {
        username == Some(self.author_display_name.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub parent_comment_id: CommentId,
    pub product_id: ProductId,
    pub content: String,
}

impl NewReply {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub content: String,
}

impl EditComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub rating: u8,
    pub content: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_rating(self.rating)?;
        if let Some(content) = &self.content {
            crate::validate_string(content)?;
        }
        Ok(())
    }
}
