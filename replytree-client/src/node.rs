use std::sync::Arc;

use async_recursion::async_recursion;

use crate::{
    api::{Api, Comment, CommentId, ProductId, MAX_DEPTH},
    Clock, CommentEntry, Cursor, ExpansionPath, Mount, PathCursor, Session, ThreadConfig,
};

/// Everything a node needs from its surroundings to load and mutate
#[derive(Clone)]
pub struct Ctx {
    pub api: Arc<dyn Api>,
    pub clock: Arc<dyn Clock>,
    pub config: ThreadConfig,
    pub session: Session,
    pub product: ProductId,
    pub expansion: Option<ExpansionPath>,
}

/// How the replies of a node get listed, fixed by the node's depth
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChildrenStrategy {
    /// Direct replies, each a node of its own
    Recursive,

    /// All descendants as one flat list, no further nesting
    Flattened,
}

impl ChildrenStrategy {
    pub fn for_depth(depth: usize) -> ChildrenStrategy {
        match depth >= MAX_DEPTH {
            true => ChildrenStrategy::Flattened,
            false => ChildrenStrategy::Recursive,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Children {
    Recursive(Cursor<ReplyNode>),
    Flattened(Cursor<CommentEntry>),
}

impl Children {
    fn for_strategy(strategy: ChildrenStrategy) -> Children {
        match strategy {
            ChildrenStrategy::Recursive => Children::Recursive(Cursor::new()),
            ChildrenStrategy::Flattened => Children::Flattened(Cursor::new()),
        }
    }

    pub fn strategy(&self) -> ChildrenStrategy {
        match self {
            Children::Recursive(_) => ChildrenStrategy::Recursive,
            Children::Flattened(_) => ChildrenStrategy::Flattened,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Children::Recursive(c) => c.items().len(),
            Children::Flattened(c) => c.items().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        match self {
            Children::Recursive(c) => c.has_more(),
            Children::Flattened(c) => c.has_more(),
        }
    }

    pub fn next_page(&self) -> u32 {
        match self {
            Children::Recursive(c) => c.next_page(),
            Children::Flattened(c) => c.next_page(),
        }
    }

    pub fn is_loading(&self) -> bool {
        match self {
            Children::Recursive(c) => c.is_loading(),
            Children::Flattened(c) => c.is_loading(),
        }
    }

    pub fn nodes(&self) -> &[ReplyNode] {
        match self {
            Children::Recursive(c) => c.items(),
            Children::Flattened(_) => &[],
        }
    }

    pub fn flat(&self) -> &[CommentEntry] {
        match self {
            Children::Recursive(_) => &[],
            Children::Flattened(c) => c.items(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
    Collapsed,
    Loading,
    Loaded,
    LoadingMore,
    Exhausted,
}

/// Where a comment sits in a tree, relative to the node the search started at
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    /// A node, reached by following these child indices
    Node(Vec<usize>),

    /// Entry number `.1` of the flattened list of the node at `.0`
    Flat(Vec<usize>, usize),
}

/// A comment that can open its replies: nested ones while shallow, a
/// flattened list once at `MAX_DEPTH`
#[derive(Clone, Debug)]
pub struct ReplyNode {
    entry: CommentEntry,
    depth: usize,
    expanded: bool,
    children: Children,

    /// Cursor to hand to children, Some only if this node is on the deep link path
    child_path: Option<PathCursor>,

    /// Set at mount when the deep link requires this node open
    pending_auto_expand: bool,
}

impl ReplyNode {
    pub fn mount(
        comment: Comment,
        depth: usize,
        path: Option<PathCursor>,
        ctx: &Ctx,
    ) -> ReplyNode {
        let (child_path, pending_auto_expand) = match (&ctx.expansion, path) {
            (Some(p), Some(cursor)) => (
                cursor.descend(p, comment.id),
                cursor.needs_expand(p, comment.id),
            ),
            _ => (None, false),
        };
        let entry = CommentEntry::mount(comment, path, ctx);
        ReplyNode {
            entry,
            depth,
            expanded: false,
            children: Children::for_strategy(ChildrenStrategy::for_depth(depth)),
            child_path,
            pending_auto_expand,
        }
    }

    pub fn id(&self) -> CommentId {
        self.entry.id()
    }

    pub fn entry(&self) -> &CommentEntry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut CommentEntry {
        &mut self.entry
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn strategy(&self) -> ChildrenStrategy {
        self.children.strategy()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn state(&self) -> NodeState {
        if !self.expanded {
            return NodeState::Collapsed;
        }
        match (self.children.is_loading(), self.children.is_empty()) {
            (true, true) => NodeState::Loading,
            (true, false) => NodeState::LoadingMore,
            (false, _) if !self.children.has_more() => NodeState::Exhausted,
            (false, _) => NodeState::Loaded,
        }
    }

    /// Open or close the replies. Opening only fetches when nothing is cached.
    pub async fn toggle(&mut self, ctx: &Ctx) {
        if self.expanded {
            self.expanded = false;
            return;
        }
        self.expanded = true;
        if self.children.is_empty() {
            self.load_page(0, ctx).await;
        } else {
            tracing::debug!(comment = %self.id(), "replies already loaded, not refetching");
        }
    }

    pub async fn load_more(&mut self, ctx: &Ctx) {
        let page = self.children.next_page();
        self.load_page(page, ctx).await;
    }

    /// Something changed below this node: list its replies again from page 0
    pub async fn refresh(&mut self, ctx: &Ctx) {
        self.load_page(0, ctx).await;
    }

    /// Open the replies and reload them from page 0, used after replying here
    pub async fn show_fresh_replies(&mut self, ctx: &Ctx) {
        self.expanded = true;
        self.load_page(0, ctx).await;
    }

    #[async_recursion]
    pub async fn load_page(&mut self, page: u32, ctx: &Ctx) {
        let id = self.id();
        let depth = self.depth;
        let size = ctx.config.reply_page_size;
        let child_path = self.child_path;
        match &mut self.children {
            Children::Recursive(cursor) => {
                let ticket = match cursor.begin(page) {
                    Some(t) => t,
                    None => return,
                };
                match ctx.api.fetch_replies(id, page, size).await {
                    Ok(resp) => {
                        cursor.finish(ticket, resp, |c| {
                            ReplyNode::mount(c, depth + 1, child_path, ctx)
                        });
                    }
                    Err(err) => {
                        tracing::warn!(?err, comment = %id, page, "failed fetching replies");
                        cursor.abandon(ticket);
                    }
                }
            }
            Children::Flattened(cursor) => {
                let ticket = match cursor.begin(page) {
                    Some(t) => t,
                    None => return,
                };
                match ctx.api.fetch_descendants(id, page, size).await {
                    Ok(resp) => {
                        let flat_path = child_path
                            .zip(ctx.expansion.as_ref())
                            .map(|(c, p)| c.flatten(p));
                        cursor.finish(ticket, resp, |c| CommentEntry::mount(c, flat_path, ctx));
                    }
                    Err(err) => {
                        tracing::warn!(?err, comment = %id, page, "failed fetching descendants");
                        cursor.abandon(ticket);
                    }
                }
            }
        }
        self.expand_pending(ctx).await;
    }

    /// Open the children the deep link goes through, once, right after they
    /// got mounted
    #[async_recursion]
    pub async fn expand_pending(&mut self, ctx: &Ctx) {
        if let Children::Recursive(cursor) = &mut self.children {
            for child in cursor.items_mut() {
                child.expand_if_pending(ctx).await;
            }
        }
    }

    pub(crate) async fn expand_if_pending(&mut self, ctx: &Ctx) {
        if !self.pending_auto_expand {
            return;
        }
        self.pending_auto_expand = false;
        tracing::debug!(comment = %self.id(), "opening replies on the way to deep link");
        self.expanded = true;
        if self.children.is_empty() {
            self.load_page(0, ctx).await;
        }
    }

    pub fn locate(&self, id: CommentId) -> Option<Slot> {
        let mut trail = Vec::new();
        self.locate_in(id, &mut trail)
    }

    fn locate_in(&self, id: CommentId, trail: &mut Vec<usize>) -> Option<Slot> {
        if self.id() == id {
            return Some(Slot::Node(trail.clone()));
        }
        match &self.children {
            Children::Recursive(cursor) => {
                for (i, child) in cursor.items().iter().enumerate() {
                    trail.push(i);
                    if let Some(slot) = child.locate_in(id, trail) {
                        return Some(slot);
                    }
                    trail.pop();
                }
                None
            }
            Children::Flattened(cursor) => cursor
                .items()
                .iter()
                .position(|e| e.id() == id)
                .map(|i| Slot::Flat(trail.clone(), i)),
        }
    }

    pub fn node_at(&self, trail: &[usize]) -> Option<&ReplyNode> {
        match trail.split_first() {
            None => Some(self),
            Some((i, rest)) => self.children.nodes().get(*i)?.node_at(rest),
        }
    }

    pub fn node_at_mut(&mut self, trail: &[usize]) -> Option<&mut ReplyNode> {
        match trail.split_first() {
            None => Some(self),
            Some((i, rest)) => match &mut self.children {
                Children::Recursive(cursor) => cursor.items_mut().get_mut(*i)?.node_at_mut(rest),
                Children::Flattened(_) => None,
            },
        }
    }

    pub fn flat_mut(&mut self, i: usize) -> Option<&mut CommentEntry> {
        match &mut self.children {
            Children::Recursive(_) => None,
            Children::Flattened(cursor) => cursor.items_mut().get_mut(i),
        }
    }

    /// Depth-first walk over every entry displayed at or below this node
    pub fn for_each_entry<'s>(&'s self, f: &mut dyn FnMut(usize, &'s CommentEntry)) {
        f(self.depth, &self.entry);
        match &self.children {
            Children::Recursive(cursor) => {
                for child in cursor.items() {
                    child.for_each_entry(f);
                }
            }
            Children::Flattened(cursor) => {
                for e in cursor.items() {
                    f(self.depth + 1, e);
                }
            }
        }
    }
}

impl Mount for ReplyNode {
    fn key(&self) -> CommentId {
        self.entry.id()
    }

    fn update(&mut self, comment: Comment) {
        self.entry.update(comment);
    }
}
