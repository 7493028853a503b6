use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use replytree_api::{
    Api, Comment, CommentId, EditComment, Eligibility, Error, IneligibleReason, NewReply,
    NewReview, OrderId, Page, ProductId, Time,
};

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Order {
    pub id: OrderId,
    pub username: String,
    pub product: ProductId,
    pub completed: bool,
}

/// Everything the mock server knows, loadable from JSON
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Fixture {
    pub users: Vec<User>,
    pub products: Vec<ProductId>,
    pub orders: Vec<Order>,
    pub comments: Vec<Comment>,
}

impl Fixture {
    pub fn from_json(data: &str) -> serde_json::Result<Fixture> {
        serde_json::from_str(data)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    Reviews,
    Replies,
    Descendants,
    Ancestors,
    PostReply,
    EditComment,
    DeleteComment,
    Eligibility,
    PostReview,
}

/// One request the mock server answered (or refused)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Call {
    pub endpoint: Endpoint,

    /// The product or comment the request was about
    pub target: i64,
    pub page: Option<u32>,
}

/// In-memory stand-in for the comment REST backend
pub struct MockServer(Mutex<State>);

struct State {
    fixture: Fixture,
    clock: Time,
    calls: Vec<Call>,
    failing: HashSet<Endpoint>,
}

impl State {
    fn record(&mut self, endpoint: Endpoint, target: i64, page: Option<u32>) -> Result<(), Error> {
        tracing::debug!(?endpoint, target, ?page, "mock server got request");
        self.calls.push(Call {
            endpoint,
            target,
            page,
        });
        match self.failing.contains(&endpoint) {
            true => Err(Error::Transport(format!("injected failure on {endpoint:?}"))),
            false => Ok(()),
        }
    }

    fn tick(&mut self) -> Time {
        self.clock = self.clock + Duration::seconds(1);
        self.clock
    }

    fn next_id(&self) -> CommentId {
        CommentId(
            self.fixture
                .comments
                .iter()
                .map(|c| c.id.0)
                .max()
                .unwrap_or(0)
                + 1,
        )
    }

    fn comment(&self, id: CommentId) -> Result<&Comment, Error> {
        self.fixture
            .comments
            .iter()
            .find(|c| c.id == id)
            .ok_or(Error::NotFound(id))
    }

    fn user(&self, name: &str) -> Result<&User, Error> {
        self.fixture
            .users
            .iter()
            .find(|u| u.name == name)
            .ok_or(Error::PermissionDenied)
    }

    fn ensure_product(&mut self, product: ProductId) {
        if !self.fixture.products.contains(&product) {
            self.fixture.products.push(product);
        }
    }

    fn ensure_user(&mut self, name: &str) {
        if self.user(name).is_err() {
            self.fixture.users.push(User {
                name: String::from(name),
                image_url: None,
            });
        }
    }

    fn insert(
        &mut self,
        author: &str,
        product: ProductId,
        parent: Option<CommentId>,
        content: Option<String>,
        rating: Option<u8>,
    ) -> Comment {
        let author_image_url = self.user(author).ok().and_then(|u| u.image_url.clone());
        let comment = Comment {
            id: self.next_id(),
            author_display_name: String::from(author),
            author_image_url,
            content,
            created_at: self.tick(),
            parent_id: parent,
            product_id: product,
            rating,
        };
        self.fixture.comments.push(comment.clone());
        comment
    }

    /// All comments strictly below `parent`, oldest first
    fn descendants(&self, parent: CommentId) -> Vec<Comment> {
        let mut children = HashMap::<CommentId, Vec<&Comment>>::new();
        for c in &self.fixture.comments {
            if let Some(p) = c.parent_id {
                children.entry(p).or_default().push(c);
            }
        }
        let mut res = Vec::new();
        let mut todo = vec![parent];
        while let Some(id) = todo.pop() {
            for c in children.get(&id).into_iter().flatten() {
                res.push((*c).clone());
                todo.push(c.id);
            }
        }
        res.sort_by_key(|c| (c.created_at, c.id));
        res
    }

    fn eligibility(&self, product: ProductId, username: &str) -> Eligibility {
        let order = self
            .fixture
            .orders
            .iter()
            .find(|o| o.product == product && o.username == username && o.completed);
        let order_id = match order {
            Some(o) => o.id,
            None => {
                return Eligibility::Ineligible {
                    reason: IneligibleReason::NoCompletedPurchase,
                }
            }
        };
        let reviewed = self.fixture.comments.iter().any(|c| {
            c.product_id == product && c.parent_id.is_none() && c.author_display_name == username
        });
        match reviewed {
            true => Eligibility::Ineligible {
                reason: IneligibleReason::AlreadyReviewed,
            },
            false => Eligibility::Eligible { order_id },
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::from_fixture(Fixture::default())
    }

    pub fn from_fixture(fixture: Fixture) -> MockServer {
        let clock = fixture
            .comments
            .iter()
            .map(|c| c.created_at)
            .max()
            .or_else(|| Utc.timestamp_opt(1_600_000_000, 0).single())
            .unwrap_or_else(Utc::now);
        MockServer(Mutex::new(State {
            fixture,
            clock,
            calls: Vec::new(),
            failing: HashSet::new(),
        }))
    }

    pub fn test_add_user(&self, name: &str) {
        self.0.lock().ensure_user(name);
    }

    /// Record that `username` bought `product`, returning the order
    pub fn test_add_order(&self, username: &str, product: ProductId, completed: bool) -> OrderId {
        let mut s = self.0.lock();
        s.ensure_user(username);
        s.ensure_product(product);
        let id = OrderId(s.fixture.orders.len() as i64 + 1);
        s.fixture.orders.push(Order {
            id,
            username: String::from(username),
            product,
            completed,
        });
        id
    }

    pub fn test_add_review(
        &self,
        author: &str,
        product: ProductId,
        rating: u8,
        content: &str,
    ) -> CommentId {
        let mut s = self.0.lock();
        s.ensure_user(author);
        s.ensure_product(product);
        s.insert(author, product, None, Some(String::from(content)), Some(rating))
            .id
    }

    /// Add a reply under `parent`, which must exist
    pub fn test_add_reply(&self, author: &str, parent: CommentId, content: &str) -> CommentId {
        let mut s = self.0.lock();
        s.ensure_user(author);
        let product = s
            .comment(parent)
            .unwrap_or_else(|_| panic!("replying to unknown comment {parent}"))
            .product_id;
        s.insert(author, product, Some(parent), Some(String::from(content)), None)
            .id
    }

    pub fn test_comment(&self, id: CommentId) -> Option<Comment> {
        self.0.lock().comment(id).ok().cloned()
    }

    /// Make every following request to `endpoint` fail
    pub fn test_fail(&self, endpoint: Endpoint) {
        self.0.lock().failing.insert(endpoint);
    }

    pub fn test_heal(&self, endpoint: Endpoint) {
        self.0.lock().failing.remove(&endpoint);
    }

    pub fn test_calls(&self) -> Vec<Call> {
        self.0.lock().calls.clone()
    }

    pub fn test_count_calls(&self, endpoint: Endpoint, target: i64) -> usize {
        self.0
            .lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint && c.target == target)
            .count()
    }

    pub fn test_clear_calls(&self) {
        self.0.lock().calls.clear();
    }
}

impl Default for MockServer {
    fn default() -> Self {
        MockServer::new()
    }
}

#[async_trait]
impl Api for MockServer {
    async fn fetch_reviews(
        &self,
        product: ProductId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::Reviews, product.0, Some(page))?;
        if !s.fixture.products.contains(&product) {
            return Err(Error::ProductNotFound(product));
        }
        let mut reviews = s
            .fixture
            .comments
            .iter()
            .filter(|c| c.product_id == product && c.parent_id.is_none())
            .cloned()
            .collect::<Vec<_>>();
        reviews.sort_by_key(|c| std::cmp::Reverse((c.created_at, c.id)));
        Ok(Page::slice(&reviews, page, size))
    }

    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::Replies, parent.0, Some(page))?;
        s.comment(parent)?;
        let mut replies = s
            .fixture
            .comments
            .iter()
            .filter(|c| c.parent_id == Some(parent))
            .cloned()
            .collect::<Vec<_>>();
        replies.sort_by_key(|c| (c.created_at, c.id));
        let mut res = Page::slice(&replies, page, size);
        res.total_pages = 0;
        Ok(res)
    }

    async fn fetch_descendants(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::Descendants, parent.0, Some(page))?;
        s.comment(parent)?;
        let mut res = Page::slice(&s.descendants(parent), page, size);
        res.total_pages = 0;
        Ok(res)
    }

    async fn fetch_ancestors(&self, comment: CommentId) -> Result<Vec<CommentId>, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::Ancestors, comment.0, None)?;
        let mut res = Vec::new();
        let mut cur = s.comment(comment)?.parent_id;
        while let Some(id) = cur {
            res.push(id);
            cur = s.comment(id)?.parent_id;
        }
        res.reverse();
        Ok(res)
    }

    async fn post_reply(&self, reply: NewReply, username: &str) -> Result<Comment, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::PostReply, reply.parent_comment_id.0, None)?;
        s.user(username)?;
        reply.validate()?;
        let parent = s.comment(reply.parent_comment_id)?;
        if parent.product_id != reply.product_id {
            return Err(Error::NotFound(reply.parent_comment_id));
        }
        Ok(s.insert(
            username,
            reply.product_id,
            Some(reply.parent_comment_id),
            Some(reply.content),
            None,
        ))
    }

    async fn edit_comment(
        &self,
        comment: CommentId,
        edit: EditComment,
        username: &str,
    ) -> Result<(), Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::EditComment, comment.0, None)?;
        edit.validate()?;
        let c = s
            .fixture
            .comments
            .iter_mut()
            .find(|c| c.id == comment)
            .ok_or(Error::NotFound(comment))?;
        if c.author_display_name != username {
            return Err(Error::PermissionDenied);
        }
        c.content = Some(edit.content);
        Ok(())
    }

    async fn delete_comment(&self, comment: CommentId, username: &str) -> Result<(), Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::DeleteComment, comment.0, None)?;
        if s.comment(comment)?.author_display_name != username {
            return Err(Error::PermissionDenied);
        }
        let removed = s
            .descendants(comment)
            .into_iter()
            .map(|c| c.id)
            .chain(std::iter::once(comment))
            .collect::<HashSet<_>>();
        s.fixture.comments.retain(|c| !removed.contains(&c.id));
        tracing::debug!(%comment, removed = removed.len(), "deleted comment subtree");
        Ok(())
    }

    async fn review_eligibility(
        &self,
        product: ProductId,
        username: &str,
    ) -> Result<Eligibility, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::Eligibility, product.0, None)?;
        if !s.fixture.products.contains(&product) {
            return Err(Error::ProductNotFound(product));
        }
        if s.user(username).is_err() {
            return Ok(Eligibility::Ineligible {
                reason: IneligibleReason::NotLoggedIn,
            });
        }
        Ok(s.eligibility(product, username))
    }

    async fn post_review(&self, review: NewReview, username: &str) -> Result<Comment, Error> {
        let mut s = self.0.lock();
        s.record(Endpoint::PostReview, review.product_id.0, None)?;
        s.user(username)?;
        review.validate()?;
        match s.eligibility(review.product_id, username) {
            Eligibility::Eligible { order_id } if order_id == review.order_id => (),
            Eligibility::Eligible { .. } => {
                return Err(Error::NotEligible(IneligibleReason::NoCompletedPurchase))
            }
            Eligibility::Ineligible { reason } => return Err(Error::NotEligible(reason)),
        }
        Ok(s.insert(
            username,
            review.product_id,
            None,
            review.content,
            Some(review.rating),
        ))
    }
}
