use chrono::Utc;

mod api;
pub use api::Api;

mod comment;
pub use comment::{Comment, CommentId, EditComment, NewReply, NewReview};

mod error;
pub use error::Error;

mod page;
pub use page::Page;

mod product;
pub use product::{Eligibility, IneligibleReason, OrderId, ProductId};

pub type Time = chrono::DateTime<Utc>;

/// Nodes at this depth or deeper list their replies as one flattened page
/// of descendants instead of nesting further
pub const MAX_DEPTH: usize = 2;

pub const DEFAULT_REVIEW_PAGE_SIZE: u32 = 5;
pub const DEFAULT_REPLY_PAGE_SIZE: u32 = 5;
pub const HIGHLIGHT_DURATION_MS: i64 = 3000;

// The functions below are what the `validate` functions of the request types
// are built from. Servers are expected to call them on every request body.
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    match s.trim().is_empty() {
        true => Err(Error::EmptyContent),
        false => Ok(()),
    }
}

pub fn validate_rating(rating: u8) -> Result<(), Error> {
    match rating {
        1..=5 => Ok(()),
        r => Err(Error::InvalidRating(r)),
    }
}
