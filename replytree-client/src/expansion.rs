use crate::api::{Api, CommentId, Error};

/// Where a deep link points to, and the comments that must be opened on the
/// way there
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpansionPath {
    pub target: CommentId,

    /// Root first, the target itself excluded
    pub ancestors: Vec<CommentId>,
}

impl ExpansionPath {
    pub async fn resolve(api: &dyn Api, target: CommentId) -> Result<ExpansionPath, Error> {
        let ancestors = api.fetch_ancestors(target).await?;
        tracing::debug!(%target, ?ancestors, "resolved deep link");
        Ok(ExpansionPath { target, ancestors })
    }

    pub fn start(&self) -> PathCursor {
        PathCursor { pos: 0 }
    }
}

/// Position of a tree level along an `ExpansionPath`. Only handed down
/// through nodes that matched, so the walk stops at the first divergence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PathCursor {
    pos: usize,
}

impl PathCursor {
    /// Whether `id` is the ancestor expected at this level, ie. must be
    /// forced open
    pub fn needs_expand(&self, path: &ExpansionPath, id: CommentId) -> bool {
        path.ancestors.get(self.pos) == Some(&id)
    }

    /// Whether `id` is the deep link target reached at the end of the path
    pub fn is_target(&self, path: &ExpansionPath, id: CommentId) -> bool {
        self.is_exhausted(path) && path.target == id
    }

    pub fn is_exhausted(&self, path: &ExpansionPath) -> bool {
        self.pos >= path.ancestors.len()
    }

    /// The cursor to hand to the children of `id`, if `id` is on the path
    pub fn descend(&self, path: &ExpansionPath, id: CommentId) -> Option<PathCursor> {
        self.needs_expand(path, id).then(|| PathCursor { pos: self.pos + 1 })
    }

    /// The cursor to hand to a flattened listing of all descendants: they
    /// are all displayed at once, so the remaining hops need no opening
    pub fn flatten(&self, path: &ExpansionPath) -> PathCursor {
        PathCursor {
            pos: std::cmp::max(self.pos, path.ancestors.len()),
        }
    }
}

/// Extract the `replyId` parameter out of a query string like `?tab=reviews&replyId=13`
pub fn deep_link_target(query: &str) -> Option<CommentId> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == "replyId")
        .and_then(|(_, v)| v.parse().ok())
}
