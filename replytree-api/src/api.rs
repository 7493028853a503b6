use async_trait::async_trait;

use crate::{
    Comment, CommentId, EditComment, Eligibility, Error, NewReply, NewReview, Page, ProductId,
};

/// The REST collaborator the comment tree is loaded from and mutated through.
///
/// Mutations carry the acting username. The server is the one enforcing
/// ownership, clients only use it to decide what to offer.
#[async_trait]
pub trait Api: Send + Sync {
    /// Top-level reviews of a product, newest first
    async fn fetch_reviews(
        &self,
        product: ProductId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error>;

    /// Direct replies of a comment
    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error>;

    /// Every comment below `parent`, whatever its depth, as a single flat list
    async fn fetch_descendants(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error>;

    /// Ids of the comments strictly above `comment`, root first
    async fn fetch_ancestors(&self, comment: CommentId) -> Result<Vec<CommentId>, Error>;

    async fn post_reply(&self, reply: NewReply, username: &str) -> Result<Comment, Error>;

    async fn edit_comment(
        &self,
        comment: CommentId,
        edit: EditComment,
        username: &str,
    ) -> Result<(), Error>;

    async fn delete_comment(&self, comment: CommentId, username: &str) -> Result<(), Error>;

    async fn review_eligibility(
        &self,
        product: ProductId,
        username: &str,
    ) -> Result<Eligibility, Error>;

    async fn post_review(&self, review: NewReview, username: &str) -> Result<Comment, Error>;
}
