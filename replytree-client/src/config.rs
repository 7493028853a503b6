use crate::api::{DEFAULT_REPLY_PAGE_SIZE, DEFAULT_REVIEW_PAGE_SIZE, HIGHLIGHT_DURATION_MS};

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ThreadConfig {
    pub review_page_size: u32,
    pub reply_page_size: u32,
    pub highlight_duration_ms: i64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        ThreadConfig {
            review_page_size: DEFAULT_REVIEW_PAGE_SIZE,
            reply_page_size: DEFAULT_REPLY_PAGE_SIZE,
            highlight_duration_ms: HIGHLIGHT_DURATION_MS,
        }
    }
}

/// Who is looking at the thread. Anonymous sessions can browse but not post.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
    pub username: Option<String>,
}

impl Session {
    pub fn anonymous() -> Session {
        Session { username: None }
    }

    pub fn user(name: impl Into<String>) -> Session {
        Session {
            username: Some(name.into()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}
