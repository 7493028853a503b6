use std::sync::Arc;

use crate::{
    api::{
        Api, Comment, CommentId, Eligibility, IneligibleReason, NewReview, OrderId, Page,
        ProductId,
    },
    Clock, CommentEntry, Ctx, ExpansionPath, Mount, NodeState, Outcome, ReplyNode, ReviewDraft,
    Session, Slot, ThreadConfig,
};

const TRACE_FAILED: &str = "Could not trace the replied comment";
const RATING_REQUIRED: &str = "Please select a rating before submitting your review";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Something the user has to be told
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    /// Non-blocking, fades out on its own
    Toast { kind: ToastKind, message: String },

    /// Blocking, has to be dismissed
    Alert(String),
}

impl Notice {
    fn error(message: impl Into<String>) -> Notice {
        Notice::Toast {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Notice {
        Notice::Toast {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EligibilityState {
    Loading,
    Eligible(OrderId),
    Ineligible(IneligibleReason),
}

impl From<Eligibility> for EligibilityState {
    fn from(e: Eligibility) -> EligibilityState {
        match e {
            Eligibility::Eligible { order_id } => EligibilityState::Eligible(order_id),
            Eligibility::Ineligible { reason } => EligibilityState::Ineligible(reason),
        }
    }
}

/// The reviews of one product, a page at a time, and the root every reply
/// tree refresh bubbles up to
pub struct ReviewList {
    ctx: Ctx,
    page: u32,
    total_pages: u32,
    reviews: Vec<ReplyNode>,
    eligibility: EligibilityState,
    review_draft: ReviewDraft,
    scroll_request: Option<CommentId>,
    scroll_issued: bool,
    notices: Vec<Notice>,
}

impl ReviewList {
    pub fn new(
        api: Arc<dyn Api>,
        clock: Arc<dyn Clock>,
        config: ThreadConfig,
        session: Session,
        product: ProductId,
    ) -> ReviewList {
        ReviewList {
            ctx: Ctx {
                api,
                clock,
                config,
                session,
                product,
                expansion: None,
            },
            page: 0,
            total_pages: 0,
            reviews: Vec::new(),
            eligibility: EligibilityState::Loading,
            review_draft: ReviewDraft::default(),
            scroll_request: None,
            scroll_issued: false,
            notices: Vec::new(),
        }
    }

    /// Initial load of the page, following the `replyId` deep link if any
    pub async fn open(&mut self, deep_link: Option<CommentId>) {
        if let Some(target) = deep_link {
            match ExpansionPath::resolve(&*self.ctx.api, target).await {
                Ok(path) => self.ctx.expansion = Some(path),
                Err(err) => {
                    tracing::warn!(?err, %target, "failed resolving deep link ancestors");
                    self.notices.push(Notice::error(TRACE_FAILED));
                }
            }
        }
        self.page = 0;
        let (reviews, eligibility) =
            futures::join!(self.fetch_page(0), self.fetch_eligibility());
        self.apply_eligibility(eligibility);
        self.apply_page(0, reviews).await;
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn product(&self) -> ProductId {
        self.ctx.product
    }

    pub fn expansion(&self) -> Option<&ExpansionPath> {
        self.ctx.expansion.as_ref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn reviews(&self) -> &[ReplyNode] {
        &self.reviews
    }

    pub fn eligibility(&self) -> EligibilityState {
        self.eligibility
    }

    /// The review composer, only offered to eligible users
    pub fn review_draft(&self) -> Option<&ReviewDraft> {
        match self.eligibility {
            EligibilityState::Eligible(_) => Some(&self.review_draft),
            _ => None,
        }
    }

    /// What to show in place of the review composer
    pub fn eligibility_message(&self) -> Option<&'static str> {
        match self.eligibility {
            EligibilityState::Ineligible(reason) => Some(reason.message()),
            _ => None,
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// The deep link target to scroll to, handed out once
    pub fn take_scroll_request(&mut self) -> Option<CommentId> {
        self.scroll_request.take()
    }

    pub fn node(&self, id: CommentId) -> Option<&ReplyNode> {
        self.reviews.iter().find_map(|r| match r.locate(id)? {
            Slot::Node(trail) => r.node_at(&trail),
            Slot::Flat(..) => None,
        })
    }

    pub fn entry(&self, id: CommentId) -> Option<&CommentEntry> {
        self.reviews.iter().find_map(|r| match r.locate(id)? {
            Slot::Node(trail) => r.node_at(&trail).map(|n| n.entry()),
            Slot::Flat(trail, i) => r.node_at(&trail)?.children().flat().get(i),
        })
    }

    pub fn state_of(&self, id: CommentId) -> Option<NodeState> {
        self.node(id).map(|n| n.state())
    }

    pub fn is_highlighted(&self, id: CommentId) -> bool {
        let now = self.ctx.clock.now();
        self.entry(id).map(|e| e.is_highlighted(now)).unwrap_or(false)
    }

    /// Every displayed entry in display order, with its depth
    pub fn visible_entries(&self) -> Vec<(usize, &CommentEntry)> {
        let mut res = Vec::new();
        for r in &self.reviews {
            collect_visible(r, &mut res);
        }
        res
    }

    pub async fn go_to_page(&mut self, page: u32) {
        let reviews = self.fetch_page(page).await;
        self.apply_page(page, reviews).await;
    }

    /// Something changed somewhere in the tree: reload the reviews from
    /// page 0 along with the review eligibility
    pub async fn refresh(&mut self) {
        let (reviews, eligibility) =
            futures::join!(self.fetch_page(0), self.fetch_eligibility());
        self.apply_eligibility(eligibility);
        self.apply_page(0, reviews).await;
    }

    async fn fetch_page(&self, page: u32) -> Option<Page<Comment>> {
        let size = self.ctx.config.review_page_size;
        match self.ctx.api.fetch_reviews(self.ctx.product, page, size).await {
            Ok(resp) => Some(resp),
            Err(err) => {
                tracing::warn!(?err, product = %self.ctx.product, page, "failed fetching reviews");
                None
            }
        }
    }

    async fn fetch_eligibility(&self) -> Option<EligibilityState> {
        let user = match self.ctx.session.username() {
            Some(user) => user,
            None => return Some(EligibilityState::Ineligible(IneligibleReason::NotLoggedIn)),
        };
        match self.ctx.api.review_eligibility(self.ctx.product, user).await {
            Ok(e) => Some(e.into()),
            Err(err) => {
                tracing::warn!(?err, product = %self.ctx.product, "failed fetching review eligibility");
                None
            }
        }
    }

    fn apply_eligibility(&mut self, eligibility: Option<EligibilityState>) {
        if let Some(e) = eligibility {
            self.eligibility = e;
        }
    }

    async fn apply_page(&mut self, page: u32, resp: Option<Page<Comment>>) {
        let resp = match resp {
            Some(resp) => resp,
            None => return,
        };
        let ctx = &self.ctx;
        let root = ctx.expansion.as_ref().map(|p| p.start());
        let mut previous = std::mem::take(&mut self.reviews);
        self.reviews = resp
            .content
            .into_iter()
            .map(|c| match previous.iter().position(|r| r.id() == c.id) {
                Some(i) => {
                    let mut r = previous.swap_remove(i);
                    r.update(c);
                    r
                }
                None => ReplyNode::mount(c, 0, root, ctx),
            })
            .collect();
        self.page = page;
        self.total_pages = resp.total_pages;
        for r in self.reviews.iter_mut() {
            r.expand_if_pending(ctx).await;
        }
        self.note_scroll_target();
    }

    fn note_scroll_target(&mut self) {
        if self.scroll_issued {
            return;
        }
        let target = match &self.ctx.expansion {
            Some(p) => p.target,
            None => return,
        };
        if self
            .entry(target)
            .map(|e| e.highlight().is_some())
            .unwrap_or(false)
        {
            self.scroll_request = Some(target);
            self.scroll_issued = true;
        }
    }

    fn locate(&self, id: CommentId) -> Option<(usize, Slot)> {
        self.reviews
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.locate(id).map(|slot| (i, slot)))
    }

    fn entry_mut(&mut self, id: CommentId) -> Option<&mut CommentEntry> {
        match self.locate(id)? {
            (r, Slot::Node(trail)) => self.reviews[r].node_at_mut(&trail).map(|n| n.entry_mut()),
            (r, Slot::Flat(trail, i)) => self.reviews[r].node_at_mut(&trail)?.flat_mut(i),
        }
    }

    pub async fn toggle_replies(&mut self, id: CommentId) {
        let ctx = &self.ctx;
        let node = match node_in(&mut self.reviews, id) {
            Some(n) => n,
            None => {
                tracing::debug!(comment = %id, "toggling replies of a comment that is not a displayed node");
                return;
            }
        };
        node.toggle(ctx).await;
        self.note_scroll_target();
    }

    pub async fn load_more_replies(&mut self, id: CommentId) {
        let ctx = &self.ctx;
        if let Some(node) = node_in(&mut self.reviews, id) {
            node.load_more(ctx).await;
        }
    }

    pub fn start_reply(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.start_reply();
        }
    }

    pub fn set_reply_text(&mut self, id: CommentId, text: &str) {
        if let Some(e) = self.entry_mut(id) {
            e.set_reply_text(text);
        }
    }

    pub fn cancel_reply(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.cancel_reply();
        }
    }

    pub fn start_edit(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.start_edit();
        }
    }

    pub fn set_edit_text(&mut self, id: CommentId, text: &str) {
        if let Some(e) = self.entry_mut(id) {
            e.set_edit_text(text);
        }
    }

    pub fn cancel_edit(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.cancel_edit();
        }
    }

    pub fn request_delete(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.request_delete();
        }
    }

    pub fn cancel_delete(&mut self, id: CommentId) {
        if let Some(e) = self.entry_mut(id) {
            e.cancel_delete();
        }
    }

    pub async fn submit_reply(&mut self, id: CommentId) -> Outcome {
        let (r, slot) = match self.locate(id) {
            Some(loc) => loc,
            None => return Outcome::Skipped,
        };
        let ctx = &self.ctx;
        let res = match &slot {
            Slot::Node(trail) => match self.reviews[r].node_at_mut(trail) {
                Some(node) => node.entry_mut().submit_reply(ctx).await,
                None => return Outcome::Skipped,
            },
            Slot::Flat(trail, i) => match self.reviews[r].node_at_mut(trail).and_then(|n| n.flat_mut(*i)) {
                Some(entry) => entry.submit_reply(ctx).await,
                None => return Outcome::Skipped,
            },
        };
        match res {
            Ok(Outcome::Done) => {
                self.notices.push(Notice::success("Reply posted"));
                let trail = match slot {
                    Slot::Node(trail) => {
                        if let Some(node) = self.reviews[r].node_at_mut(&trail) {
                            node.show_fresh_replies(&self.ctx).await;
                        }
                        // the replied-to node reloaded itself already
                        let mut parent = trail;
                        if parent.pop().is_none() {
                            self.refresh().await;
                            return Outcome::Done;
                        }
                        parent
                    }
                    Slot::Flat(trail, _) => trail,
                };
                self.bubble_up(r, trail).await;
                Outcome::Done
            }
            Ok(Outcome::Skipped) => Outcome::Skipped,
            Err(err) => {
                self.notices.push(Notice::error(format!("Failed to post reply: {err}")));
                Outcome::Skipped
            }
        }
    }

    pub async fn submit_edit(&mut self, id: CommentId) -> Outcome {
        self.mutate(id, Mutation::Edit).await
    }

    pub async fn confirm_delete(&mut self, id: CommentId) -> Outcome {
        self.mutate(id, Mutation::Delete).await
    }

    async fn mutate(&mut self, id: CommentId, m: Mutation) -> Outcome {
        let (r, slot) = match self.locate(id) {
            Some(loc) => loc,
            None => return Outcome::Skipped,
        };
        let ctx = &self.ctx;
        let entry = match &slot {
            Slot::Node(trail) => self.reviews[r].node_at_mut(trail).map(|n| n.entry_mut()),
            Slot::Flat(trail, i) => self.reviews[r].node_at_mut(trail).and_then(|n| n.flat_mut(*i)),
        };
        let entry = match entry {
            Some(e) => e,
            None => return Outcome::Skipped,
        };
        let res = match m {
            Mutation::Edit => entry.submit_edit(ctx).await,
            Mutation::Delete => entry.confirm_delete(ctx).await,
        };
        match res {
            Ok(Outcome::Done) => {
                self.notices.push(Notice::success(m.success_message()));
                // the holder of the comment reloads, then everything above it
                let trail = match slot {
                    Slot::Node(mut trail) => {
                        if trail.pop().is_none() {
                            self.refresh().await;
                            return Outcome::Done;
                        }
                        trail
                    }
                    Slot::Flat(trail, _) => trail,
                };
                self.bubble_up(r, trail).await;
                Outcome::Done
            }
            Ok(Outcome::Skipped) => Outcome::Skipped,
            Err(err) => {
                self.notices.push(Notice::error(format!("{}: {err}", m.failure_message())));
                Outcome::Skipped
            }
        }
    }

    /// Refresh the node at `trail` under review `review`, then each of its
    /// ancestors, then the review list itself
    async fn bubble_up(&mut self, review: usize, mut trail: Vec<usize>) {
        let ctx = &self.ctx;
        loop {
            if let Some(node) = self
                .reviews
                .get_mut(review)
                .and_then(|r| r.node_at_mut(&trail))
            {
                node.refresh(ctx).await;
            }
            if trail.pop().is_none() {
                break;
            }
        }
        self.refresh().await;
    }

    pub fn set_review_rating(&mut self, rating: u8) {
        self.review_draft.rating = rating;
    }

    pub fn set_review_content(&mut self, content: &str) {
        self.review_draft.content = String::from(content);
    }

    pub async fn submit_review(&mut self) -> Outcome {
        let order_id = match self.eligibility {
            EligibilityState::Eligible(order_id) => order_id,
            _ => return Outcome::Skipped,
        };
        if self.review_draft.rating == 0 {
            self.notices.push(Notice::Alert(String::from(RATING_REQUIRED)));
            return Outcome::Skipped;
        }
        let user = match self.ctx.session.username() {
            Some(user) => user,
            None => return Outcome::Skipped,
        };
        let review = NewReview {
            product_id: self.ctx.product,
            order_id,
            rating: self.review_draft.rating,
            content: self.review_draft.content(),
        };
        match self.ctx.api.post_review(review, user).await {
            Ok(posted) => {
                tracing::info!(review = %posted.id, product = %self.ctx.product, "posted review");
                self.review_draft = ReviewDraft::default();
                self.notices.push(Notice::success("Review posted"));
                self.refresh().await;
                Outcome::Done
            }
            Err(err) => {
                self.notices.push(Notice::error(format!("Failed to post review: {err}")));
                Outcome::Skipped
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Mutation {
    Edit,
    Delete,
}

impl Mutation {
    fn success_message(&self) -> &'static str {
        match self {
            Mutation::Edit => "Comment updated",
            Mutation::Delete => "Comment deleted",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Mutation::Edit => "Failed to update comment",
            Mutation::Delete => "Failed to delete comment",
        }
    }
}

fn collect_visible<'a>(node: &'a ReplyNode, res: &mut Vec<(usize, &'a CommentEntry)>) {
    res.push((node.depth(), node.entry()));
    if !node.is_expanded() {
        return;
    }
    for child in node.children().nodes() {
        collect_visible(child, res);
    }
    for e in node.children().flat() {
        res.push((node.depth() + 1, e));
    }
}

/// The displayed node for `id`, flattened entries excluded
fn node_in(reviews: &mut [ReplyNode], id: CommentId) -> Option<&mut ReplyNode> {
    reviews.iter_mut().find_map(|r| match r.locate(id)? {
        Slot::Node(trail) => r.node_at_mut(&trail),
        Slot::Flat(..) => None,
    })
}
