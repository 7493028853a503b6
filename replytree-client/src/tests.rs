#![cfg(test)]

use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

use chrono::{Duration, TimeZone, Utc};
use replytree_mock_server::{Endpoint, MockServer};

use crate::{
    api::{Api, CommentId, IneligibleReason, ProductId, MAX_DEPTH},
    ChildrenStrategy, EligibilityState, ManualClock, NodeState, Notice, Outcome, ReplyNode,
    ReviewList, Session, ThreadConfig, ToastKind,
};

const PRODUCT: ProductId = ProductId(1);

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

fn run<F: Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed initializing tokio runtime")
        .block_on(f)
}

struct Env {
    mock: Arc<MockServer>,
    clock: Arc<ManualClock>,
}

impl Env {
    fn new() -> Env {
        Env {
            mock: Arc::new(MockServer::new()),
            clock: Arc::new(ManualClock::new(
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            )),
        }
    }

    fn list(&self, session: Session, config: ThreadConfig) -> ReviewList {
        let api: Arc<dyn Api> = self.mock.clone();
        ReviewList::new(api, self.clock.clone(), config, session, PRODUCT)
    }

    async fn open(&self, user: Option<&str>, deep_link: Option<CommentId>) -> ReviewList {
        let session = match user {
            Some(u) => Session::user(u),
            None => Session::anonymous(),
        };
        let mut l = self.list(session, ThreadConfig::default());
        l.open(deep_link).await;
        l
    }

    fn calls(&self, endpoint: Endpoint, target: CommentId) -> usize {
        self.mock.test_count_calls(endpoint, target.0)
    }
}

/// review 10 with replies 11 and 12, 11 with reply 13, in the shape of the
/// usual deep link scenario
struct Thread {
    r10: CommentId,
    c11: CommentId,
    c12: CommentId,
    c13: CommentId,
}

fn thread(env: &Env) -> Thread {
    let m = &env.mock;
    let r10 = m.test_add_review("alice", PRODUCT, 5, "great product");
    let c11 = m.test_add_reply("bob", r10, "@alice agreed");
    let c12 = m.test_add_reply("carol", r10, "@alice not for me");
    let c13 = m.test_add_reply("alice", c11, "@bob thanks");
    Thread { r10, c11, c12, c13 }
}

fn review_ids(l: &ReviewList) -> Vec<CommentId> {
    l.reviews().iter().map(|r| r.id()).collect()
}

fn child_ids(l: &ReviewList, id: CommentId) -> Vec<CommentId> {
    let node = l.node(id).expect("node is displayed");
    node.children()
        .nodes()
        .iter()
        .map(|n| n.id())
        .chain(node.children().flat().iter().map(|e| e.id()))
        .collect()
}

#[test]
fn opens_newest_reviews_first() {
    let env = Env::new();
    let older = env.mock.test_add_review("alice", PRODUCT, 4, "older");
    let newer = env.mock.test_add_review("bob", PRODUCT, 3, "newer");
    let l = run(env.open(None, None));
    assert_eq!(review_ids(&l), vec![newer, older]);
    assert_eq!(l.total_pages(), 1);
    assert!(l.reviews().iter().all(|r| r.depth() == 0));
    assert!(l.reviews().iter().all(|r| r.state() == NodeState::Collapsed));
}

#[test]
fn review_pages_replace_each_other() {
    let env = Env::new();
    let ids = (0..7)
        .map(|i| env.mock.test_add_review(&format!("user{i}"), PRODUCT, 5, "ok"))
        .collect::<Vec<_>>();
    run(async {
        let mut l = env.open(None, None).await;
        assert_eq!(l.reviews().len(), 5);
        assert_eq!(l.total_pages(), 2);
        l.go_to_page(1).await;
        assert_eq!(l.page(), 1);
        assert_eq!(review_ids(&l), vec![ids[1], ids[0]]);
    });
}

#[test]
fn shallow_nodes_nest_and_deep_nodes_flatten() {
    let env = Env::new();
    let t = thread(&env);
    let c14 = env.mock.test_add_reply("bob", t.c13, "@alice deeper");
    let c15 = env.mock.test_add_reply("carol", c14, "@bob deepest");
    run(async {
        let mut l = env.open(None, None).await;
        l.toggle_replies(t.r10).await;
        assert_eq!(child_ids(&l, t.r10), vec![t.c11, t.c12]);
        assert_eq!(l.node(t.c11).unwrap().depth(), 1);
        assert_eq!(l.node(t.c11).unwrap().strategy(), ChildrenStrategy::Recursive);

        l.toggle_replies(t.c11).await;
        let n13 = l.node(t.c13).unwrap();
        assert_eq!(n13.depth(), MAX_DEPTH);
        assert_eq!(n13.strategy(), ChildrenStrategy::Flattened);

        l.toggle_replies(t.c13).await;
        assert_eq!(env.calls(Endpoint::Descendants, t.c13), 1);
        assert_eq!(env.calls(Endpoint::Replies, t.c13), 0);
        assert_eq!(child_ids(&l, t.c13), vec![c14, c15]);
        // flat entries have no replies control of their own
        assert!(l.node(c14).is_none());
        assert!(l.entry(c15).is_some());
        let depths = l
            .visible_entries()
            .into_iter()
            .map(|(d, e)| (e.id(), d))
            .collect::<Vec<_>>();
        assert_eq!(
            depths,
            vec![
                (t.r10, 0),
                (t.c11, 1),
                (t.c13, 2),
                (c14, 3),
                (c15, 3),
                (t.c12, 1)
            ]
        );
    });
}

#[test]
fn reopening_uses_cached_replies() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(None, None).await;
        l.toggle_replies(t.r10).await;
        assert_eq!(l.state_of(t.r10), Some(NodeState::Exhausted));
        l.toggle_replies(t.r10).await;
        assert_eq!(l.state_of(t.r10), Some(NodeState::Collapsed));
        l.toggle_replies(t.r10).await;
        assert_eq!(l.state_of(t.r10), Some(NodeState::Exhausted));
        assert_eq!(env.calls(Endpoint::Replies, t.r10), 1);
        assert_eq!(child_ids(&l, t.r10), vec![t.c11, t.c12]);
    });
}

#[test]
fn refresh_after_reply_resets_pagination() {
    let env = Env::new();
    let r = env.mock.test_add_review("alice", PRODUCT, 5, "review");
    let replies = ["a", "b", "c"]
        .iter()
        .map(|u| env.mock.test_add_reply(u, r, "reply"))
        .collect::<Vec<_>>();
    let config = ThreadConfig {
        reply_page_size: 2,
        ..ThreadConfig::default()
    };
    run(async {
        let mut l = env.list(Session::user("dave"), config);
        env.mock.test_add_user("dave");
        l.open(None).await;
        l.toggle_replies(r).await;
        assert_eq!(l.state_of(r), Some(NodeState::Loaded));
        l.load_more_replies(r).await;
        assert_eq!(child_ids(&l, r), replies);
        assert_eq!(l.state_of(r), Some(NodeState::Exhausted));
        // nothing left, no request goes out
        l.load_more_replies(r).await;
        assert_eq!(env.calls(Endpoint::Replies, r), 2);

        l.set_reply_text(r, "me too");
        assert_eq!(l.submit_reply(r).await, Outcome::Done);
        let posted = env.mock.test_comment(CommentId(replies[2].0 + 1)).unwrap();
        assert_eq!(posted.content(), "@alice me too");

        // page 0 replaced the three accumulated replies, and has_more came
        // from that response alone
        assert_eq!(child_ids(&l, r), replies[..2].to_vec());
        assert_eq!(l.state_of(r), Some(NodeState::Loaded));
        assert!(l.entry(r).unwrap().reply_draft().is_none());
    });
}

#[test]
fn deep_link_expands_path_and_highlights_target() {
    let env = Env::new();
    let t = thread(&env);
    let other = env.mock.test_add_review("erin", PRODUCT, 2, "meh");
    env.mock.test_add_reply("bob", other, "@erin why");
    run(async {
        let mut l = env.open(None, Some(t.c13)).await;
        assert_eq!(
            l.expansion().map(|p| p.ancestors.clone()),
            Some(vec![t.r10, t.c11])
        );
        assert!(l.node(t.r10).unwrap().is_expanded());
        assert!(l.node(t.c11).unwrap().is_expanded());
        assert!(!l.node(t.c12).unwrap().is_expanded());
        assert!(!l.node(other).unwrap().is_expanded());
        assert!(!l.node(t.c13).unwrap().is_expanded());
        assert_eq!(env.calls(Endpoint::Replies, t.c12), 0);
        assert_eq!(env.calls(Endpoint::Replies, other), 0);

        assert!(l.is_highlighted(t.c13));
        assert!(!l.is_highlighted(t.c11));
        assert_eq!(l.take_scroll_request(), Some(t.c13));
        assert_eq!(l.take_scroll_request(), None);

        env.clock.advance(Duration::milliseconds(2999));
        assert!(l.is_highlighted(t.c13));
        env.clock.advance(Duration::milliseconds(1));
        assert!(!l.is_highlighted(t.c13));
    });
}

#[test]
fn deep_link_reaches_flattened_descendants() {
    let env = Env::new();
    let a = env.mock.test_add_review("alice", PRODUCT, 5, "a");
    let sibling = env.mock.test_add_review("bob", PRODUCT, 4, "sibling");
    let b = env.mock.test_add_reply("bob", a, "b");
    let c = env.mock.test_add_reply("carol", b, "c");
    let d = env.mock.test_add_reply("dave", c, "d");
    let e = env.mock.test_add_reply("erin", d, "e");
    env.mock.test_add_reply("bob", sibling, "unrelated");
    run(async {
        let l = env.open(None, Some(d)).await;
        for id in [a, b, c] {
            assert!(l.node(id).unwrap().is_expanded(), "{id} should be open");
        }
        assert!(!l.node(sibling).unwrap().is_expanded());
        assert_eq!(env.calls(Endpoint::Descendants, c), 1);
        assert!(l.is_highlighted(d));
        assert!(!l.is_highlighted(e));
        env.clock.advance(Duration::milliseconds(3000));
        assert!(!l.is_highlighted(d));

        // deeper down the flattened list, the hops past the holder need no opening
        let l = env.open(None, Some(e)).await;
        assert_eq!(child_ids(&l, c), vec![d, e]);
        assert!(l.is_highlighted(e));
        assert!(!l.is_highlighted(d));
    });
}

#[test]
fn unresolvable_deep_link_still_loads() {
    let env = Env::new();
    let t = thread(&env);
    let mut l = run(env.open(None, Some(CommentId(999))));
    assert_eq!(review_ids(&l), vec![t.r10]);
    assert!(l.expansion().is_none());
    assert_eq!(
        l.take_notices(),
        vec![Notice::Toast {
            kind: ToastKind::Error,
            message: String::from("Could not trace the replied comment"),
        }]
    );
    assert!(!l.node(t.r10).unwrap().is_expanded());
}

#[test]
fn empty_reply_is_a_no_op() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(Some("carol"), None).await;
        l.toggle_replies(t.r10).await;
        l.start_reply(t.c11);
        l.set_reply_text(t.c11, "@bob    ");
        let draft = l.entry(t.c11).unwrap().reply_draft().cloned();
        assert_eq!(draft.as_ref().map(|d| d.tag()), Some("@bob "));
        env.mock.test_clear_calls();

        assert_eq!(l.submit_reply(t.c11).await, Outcome::Skipped);
        assert!(env.mock.test_calls().is_empty());
        assert_eq!(l.entry(t.c11).unwrap().reply_draft().cloned(), draft);
        assert!(l.take_notices().is_empty());
    });
}

#[test]
fn reply_on_flat_entry_refreshes_its_holder() {
    let env = Env::new();
    let t = thread(&env);
    let c14 = env.mock.test_add_reply("bob", t.c13, "@alice deep");
    run(async {
        let mut l = env.open(Some("carol"), Some(c14)).await;
        assert!(l.node(t.c13).unwrap().is_expanded());
        l.set_reply_text(c14, "even deeper");
        assert_eq!(l.submit_reply(c14).await, Outcome::Done);
        let ids = child_ids(&l, t.c13);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], c14);
        assert_eq!(l.entry(ids[1]).unwrap().comment().content(), "@bob even deeper");
        assert_eq!(env.calls(Endpoint::Descendants, t.c13), 2);
        // every ancestor reloaded too
        assert_eq!(env.calls(Endpoint::Replies, t.c11), 2);
        assert_eq!(env.calls(Endpoint::Replies, t.r10), 2);
    });
}

#[test]
fn edit_and_delete_go_through_the_owner_only() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(Some("bob"), None).await;
        l.toggle_replies(t.r10).await;
        assert!(l.entry(t.c11).unwrap().can_modify(l.session()));
        assert!(!l.entry(t.c12).unwrap().can_modify(l.session()));

        l.start_edit(t.c11);
        assert_eq!(
            l.entry(t.c11).unwrap().edit_draft().map(|d| d.text.clone()),
            Some(String::from("@alice agreed"))
        );
        l.set_edit_text(t.c11, "@alice strongly agreed");
        assert_eq!(l.submit_edit(t.c11).await, Outcome::Done);
        assert_eq!(
            l.entry(t.c11).unwrap().comment().content(),
            "@alice strongly agreed"
        );
        assert!(l.entry(t.c11).unwrap().edit_draft().is_none());

        // the server refuses, nothing changes locally
        l.set_edit_text(t.c12, "hijacked");
        assert_eq!(l.submit_edit(t.c12).await, Outcome::Skipped);
        assert_eq!(l.entry(t.c12).unwrap().comment().content(), "@alice not for me");
        assert!(l.entry(t.c12).unwrap().edit_draft().is_some());
        let notices = l.take_notices();
        assert!(matches!(
            notices.last(),
            Some(Notice::Toast { kind: ToastKind::Error, .. })
        ));

        // deleting needs confirming first
        assert_eq!(l.confirm_delete(t.c11).await, Outcome::Skipped);
        l.request_delete(t.c11);
        assert!(l.entry(t.c11).unwrap().is_confirming_delete());
        assert_eq!(l.confirm_delete(t.c11).await, Outcome::Done);
        assert_eq!(child_ids(&l, t.r10), vec![t.c12]);
        assert!(env.mock.test_comment(t.c13).is_none());
    });
}

fn page_zero_fetches(env: &Env, endpoint: Endpoint, target: CommentId) -> usize {
    env.mock
        .test_calls()
        .iter()
        .filter(|c| c.endpoint == endpoint && c.target == target.0 && c.page == Some(0))
        .count()
}

#[test]
fn holder_reloads_from_page_zero_whatever_its_state() {
    let env = Env::new();
    let r = env.mock.test_add_review("alice", PRODUCT, 5, "review");
    let replies = ["a", "c", "c"]
        .iter()
        .map(|u| env.mock.test_add_reply(u, r, "reply"))
        .collect::<Vec<_>>();
    let config = ThreadConfig {
        reply_page_size: 2,
        ..ThreadConfig::default()
    };
    run(async {
        let mut l = env.list(Session::user("c"), config);
        l.open(None).await;
        l.toggle_replies(r).await;
        l.load_more_replies(r).await;
        assert_eq!(child_ids(&l, r), replies);
        assert_eq!(l.state_of(r), Some(NodeState::Exhausted));
        assert_eq!(page_zero_fetches(&env, Endpoint::Replies, r), 1);

        // page 1 was loaded, the edit still brings the holder back to page 0
        l.start_edit(replies[2]);
        l.set_edit_text(replies[2], "edited");
        assert_eq!(l.submit_edit(replies[2]).await, Outcome::Done);
        assert_eq!(page_zero_fetches(&env, Endpoint::Replies, r), 2);
        assert_eq!(child_ids(&l, r), replies[..2].to_vec());
        assert_eq!(l.state_of(r), Some(NodeState::Loaded));

        // a collapsed holder reloads too, and stays collapsed
        l.toggle_replies(r).await;
        assert_eq!(l.state_of(r), Some(NodeState::Collapsed));
        l.request_delete(replies[1]);
        assert_eq!(l.confirm_delete(replies[1]).await, Outcome::Done);
        assert_eq!(page_zero_fetches(&env, Endpoint::Replies, r), 3);
        assert_eq!(l.state_of(r), Some(NodeState::Collapsed));
        assert_eq!(child_ids(&l, r), vec![replies[0], replies[2]]);
    });
}

#[test]
fn failed_delete_keeps_everything_in_place() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(Some("bob"), None).await;
        l.toggle_replies(t.r10).await;
        l.request_delete(t.c11);
        env.mock.test_fail(Endpoint::DeleteComment);
        let replies_before = env.calls(Endpoint::Replies, t.r10);
        l.take_notices();

        assert_eq!(l.confirm_delete(t.c11).await, Outcome::Skipped);
        assert!(matches!(
            l.take_notices().as_slice(),
            [Notice::Toast { kind: ToastKind::Error, message }]
                if message.starts_with("Failed to delete comment")
        ));
        assert!(l.entry(t.c11).unwrap().is_confirming_delete());
        assert_eq!(child_ids(&l, t.r10), vec![t.c11, t.c12]);
        assert_eq!(env.calls(Endpoint::Replies, t.r10), replies_before);
        assert!(env.mock.test_comment(t.c11).is_some());
        assert!(env.mock.test_comment(t.c13).is_some());

        // the pending confirmation goes through once the server is back
        env.mock.test_heal(Endpoint::DeleteComment);
        assert_eq!(l.confirm_delete(t.c11).await, Outcome::Done);
        assert_eq!(child_ids(&l, t.r10), vec![t.c12]);
    });
}

#[test]
fn failed_reload_after_edit_keeps_the_tree() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(Some("bob"), None).await;
        l.toggle_replies(t.r10).await;
        l.start_edit(t.c11);
        l.set_edit_text(t.c11, "@alice changed my mind");
        env.mock.test_fail(Endpoint::Replies);
        l.take_notices();

        assert_eq!(l.submit_edit(t.c11).await, Outcome::Done);
        assert!(matches!(
            l.take_notices().as_slice(),
            [Notice::Toast { kind: ToastKind::Success, .. }]
        ));
        assert_eq!(
            env.mock.test_comment(t.c11).map(|c| String::from(c.content())),
            Some(String::from("@alice changed my mind"))
        );
        assert_eq!(child_ids(&l, t.r10), vec![t.c11, t.c12]);
        assert!(l.node(t.r10).unwrap().is_expanded());
        assert!(!l.node(t.r10).unwrap().children().is_loading());
        assert_eq!(l.entry(t.c11).unwrap().comment().content(), "@alice agreed");
    });
}

#[test]
fn anonymous_users_cannot_post() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(None, None).await;
        assert_eq!(
            l.eligibility(),
            EligibilityState::Ineligible(IneligibleReason::NotLoggedIn)
        );
        assert!(env.mock.test_calls().iter().all(|c| c.endpoint != Endpoint::Eligibility));
        l.set_reply_text(t.r10, "hello");
        assert_eq!(l.submit_reply(t.r10).await, Outcome::Skipped);
        assert!(env.mock.test_calls().iter().all(|c| c.endpoint != Endpoint::PostReply));
        assert_eq!(l.take_notices().len(), 1);
    });
}

#[test]
fn failed_fetch_keeps_previous_state() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(None, None).await;
        env.mock.test_fail(Endpoint::Replies);
        l.toggle_replies(t.r10).await;
        assert!(child_ids(&l, t.r10).is_empty());
        assert!(!l.node(t.r10).unwrap().children().is_loading());
        assert!(l.take_notices().is_empty());

        env.mock.test_fail(Endpoint::Reviews);
        l.refresh().await;
        assert_eq!(review_ids(&l), vec![t.r10]);

        env.mock.test_heal(Endpoint::Replies);
        l.toggle_replies(t.r10).await;
        l.toggle_replies(t.r10).await;
        assert_eq!(child_ids(&l, t.r10), vec![t.c11, t.c12]);
    });
}

#[test]
fn ineligible_user_gets_a_message_instead_of_composer() {
    let env = Env::new();
    thread(&env);
    env.mock.test_add_order("dave", PRODUCT, false);
    let l = run(env.open(Some("dave"), None));
    assert_eq!(
        l.eligibility(),
        EligibilityState::Ineligible(IneligibleReason::NoCompletedPurchase)
    );
    assert!(l.review_draft().is_none());
    assert_eq!(
        l.eligibility_message(),
        Some(IneligibleReason::NoCompletedPurchase.message())
    );
}

#[test]
fn posting_a_review() {
    let env = Env::new();
    let t = thread(&env);
    let order = env.mock.test_add_order("dave", PRODUCT, true);
    run(async {
        let mut l = env.open(Some("dave"), None).await;
        assert_eq!(l.eligibility(), EligibilityState::Eligible(order));
        assert!(l.review_draft().is_some());

        l.set_review_content("solid");
        assert_eq!(l.submit_review().await, Outcome::Skipped);
        assert!(matches!(l.take_notices().as_slice(), [Notice::Alert(_)]));
        assert!(env.mock.test_calls().iter().all(|c| c.endpoint != Endpoint::PostReview));

        l.set_review_rating(4);
        assert_eq!(l.submit_review().await, Outcome::Done);
        assert_eq!(l.reviews().len(), 2);
        assert_ne!(l.reviews()[0].id(), t.r10);
        assert_eq!(l.reviews()[0].entry().comment().rating, Some(4));
        assert_eq!(
            l.eligibility(),
            EligibilityState::Ineligible(IneligibleReason::AlreadyReviewed)
        );
        assert!(l.review_draft().is_none());
    });
}

#[test]
fn refresh_keeps_open_nodes_open() {
    let env = Env::new();
    let t = thread(&env);
    run(async {
        let mut l = env.open(Some("carol"), None).await;
        l.toggle_replies(t.r10).await;
        l.toggle_replies(t.c11).await;
        l.start_reply(t.c12);
        l.set_reply_text(t.c13, "nice");
        assert_eq!(l.submit_reply(t.c13).await, Outcome::Done);
        assert!(l.node(t.r10).unwrap().is_expanded());
        assert!(l.node(t.c11).unwrap().is_expanded());
        assert!(l.node(t.c13).unwrap().is_expanded());
        assert!(l.entry(t.c12).unwrap().reply_draft().is_some());
    });
}

fn check_depth_bound(node: &ReplyNode) {
    if node.depth() >= MAX_DEPTH {
        assert_eq!(node.strategy(), ChildrenStrategy::Flattened);
        assert!(node.children().nodes().is_empty());
    }
    for child in node.children().nodes() {
        assert_eq!(child.depth(), node.depth() + 1);
        check_depth_bound(child);
    }
}

fn collapsed(node: &ReplyNode, res: &mut Vec<CommentId>) {
    if !node.is_expanded() {
        res.push(node.id());
        return;
    }
    for child in node.children().nodes() {
        collapsed(child, res);
    }
}

do_tokio_test!(depth_is_bounded_whatever_the_tree, Vec<u8>, |shape: Vec<u8>| async move {
    let env = Env::new();
    let mut all = Vec::new();
    for b in shape.into_iter().take(40) {
        let pick = b as usize % (all.len() + 1);
        let id = match pick {
            0 => env.mock.test_add_review("alice", PRODUCT, 5, "review"),
            i => env.mock.test_add_reply("bob", all[i - 1], "reply"),
        };
        all.push(id);
    }
    let config = ThreadConfig {
        review_page_size: 100,
        reply_page_size: 100,
        ..ThreadConfig::default()
    };
    let mut l = env.list(Session::anonymous(), config);
    l.open(None).await;
    loop {
        let mut todo = Vec::new();
        for r in l.reviews() {
            collapsed(r, &mut todo);
        }
        if todo.is_empty() {
            break;
        }
        for id in todo {
            l.toggle_replies(id).await;
        }
    }
    for r in l.reviews() {
        check_depth_bound(r);
    }
    let shown = l.visible_entries();
    assert_eq!(shown.len(), all.len());
    assert!(shown.iter().all(|(d, _)| *d <= MAX_DEPTH + 1));
});
