use std::sync::Arc;
use std::time::Duration;

use agora_core::cache::CacheEvent;
use agora_core::comment::{Comment, CommentQuery, MAX_REPLY_DEPTH, NewComment};
use agora_core::session::StaticSession;
use agora_core::store::{CommentStore, MemoryCommentStore, StoreOperation};
use agora_core::thread::{CommentThread, NodeState};
use agora_core::ErrorKind;
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryCommentStore>,
    post_id: Uuid,
    alice: Uuid,
    bob: Uuid,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryCommentStore::new()),
            post_id: Uuid::now_v7(),
            alice: Uuid::now_v7(),
            bob: Uuid::now_v7(),
        }
    }

    fn thread_as(&self, user_id: Option<Uuid>) -> CommentThread<MemoryCommentStore> {
        let session = match user_id {
            Some(user_id) => StaticSession::signed_in(user_id),
            None => StaticSession::anonymous(),
        };

        CommentThread::new(self.post_id, Arc::clone(&self.store), Arc::new(session))
    }

    async fn comment(&self, author_id: Uuid, body: &str, parent_id: Option<Uuid>) -> Comment {
        let mut new_comment = NewComment::new(self.post_id, author_id, body);
        if let Some(parent_id) = parent_id {
            new_comment = new_comment.with_parent(parent_id);
        }

        self.store.insert(new_comment).await.unwrap()
    }
}

fn bodies(thread: &CommentThread<MemoryCommentStore>) -> Vec<(usize, String)> {
    thread
        .lines(None)
        .into_iter()
        .map(|line| (line.depth, line.comment.body.clone()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn sibling_replies_resolve_in_any_order() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    let c2 = fixture.comment(fixture.alice, "c2", None).await;
    fixture.comment(fixture.bob, "c1-a", Some(c1.id)).await;
    fixture.comment(fixture.bob, "c1-b", Some(c1.id)).await;
    fixture.comment(fixture.bob, "c2-a", Some(c2.id)).await;
    fixture.store.set_reply_latency(c1.id, Duration::from_millis(50));

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();

    let slow = thread.request_expand(c1.id).unwrap();
    let fast = thread.request_expand(c2.id).unwrap();
    assert!(thread.node(c1.id).unwrap().state().is_loading());

    let fast_result = fast.await;
    assert!(thread.apply_replies(c2.id, fast_result));
    assert!(thread.node(c1.id).unwrap().state().is_loading());

    let slow_result = slow.await;
    assert!(thread.apply_replies(c1.id, slow_result));

    assert_eq!(
        bodies(&thread),
        [
            (0, "c1".to_owned()),
            (1, "c1-a".to_owned()),
            (1, "c1-b".to_owned()),
            (0, "c2".to_owned()),
            (1, "c2-a".to_owned()),
        ]
    );

    for node in thread.node(c1.id).unwrap().children() {
        assert_eq!(node.comment().parent_id, Some(c1.id));
    }
}

#[tokio::test]
async fn invalidating_unknown_key_does_not_fetch() {
    let fixture = Fixture::new();
    let thread = fixture.thread_as(None);

    let marked = thread
        .cache()
        .invalidate_key(&CommentQuery::Replies {
            parent_id: Uuid::now_v7(),
        });

    assert!(!marked);
    assert!(thread.cache().is_empty());
    assert_eq!(fixture.store.calls(StoreOperation::FetchReplies), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_expands_share_one_fetch() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    fixture.comment(fixture.bob, "reply", Some(c1.id)).await;
    fixture.store.set_latency(Duration::from_millis(20));

    let mut thread = fixture.thread_as(None);
    thread.refresh().await.unwrap();

    let loads: Vec<_> = (0..4).map(|_| thread.request_expand(c1.id).unwrap()).collect();
    let results = futures::future::join_all(loads).await;

    assert_eq!(fixture.store.calls(StoreOperation::FetchReplies), 1);
    for result in results {
        assert_eq!(result.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn submitted_comment_appears_after_refresh() {
    let fixture = Fixture::new();
    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    assert!(thread.roots().is_empty());

    thread.composer_mut().set_body("  hello  ");
    let created = thread.submit().await.unwrap();

    assert_eq!(created.body, "hello");
    assert_eq!(thread.composer().body(), "");
    assert_eq!(thread.roots().len(), 1);
    assert_eq!(thread.roots()[0].comment().id, created.id);
    assert_eq!(fixture.store.calls(StoreOperation::FetchTopLevel), 2);
}

#[tokio::test]
async fn reply_is_counted_on_its_target() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.bob, "c1", None).await;

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    thread.begin_reply(c1.id).unwrap();
    assert!(thread.composer().is_focused());

    thread.composer_mut().set_body("answer");
    let reply = thread.submit().await.unwrap();

    assert_eq!(reply.parent_id, Some(c1.id));
    assert_eq!(thread.composer().reply_target(), None);
    let target = thread.node(c1.id).unwrap();
    assert_eq!(target.comment().reply_count, 1);
    assert!(target.can_show_replies());
}

#[tokio::test]
async fn blank_or_anonymous_submit_is_rejected_locally() {
    let fixture = Fixture::new();

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.composer_mut().set_body(" \n\t ");
    let error = thread.submit().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    let mut anonymous = fixture.thread_as(None);
    anonymous.composer_mut().set_body("hello");
    let error = anonymous.submit().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);

    assert_eq!(fixture.store.calls(StoreOperation::Insert), 0);
}

#[tokio::test]
async fn failed_submit_keeps_the_draft() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.bob, "c1", None).await;

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    thread.begin_reply(c1.id).unwrap();
    thread.composer_mut().set_body("draft");

    fixture.store.set_failing(StoreOperation::Insert, true);
    let error = thread.submit().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DataAccess);
    assert_eq!(thread.composer().body(), "draft");
    assert_eq!(thread.composer().reply_target(), Some(c1.id));

    fixture.store.set_failing(StoreOperation::Insert, false);
    thread.submit().await.unwrap();
    assert_eq!(thread.composer().body(), "");
}

#[tokio::test]
async fn foreign_comments_cannot_be_deleted() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.bob, "bob's", None).await;
    let c2 = fixture.comment(fixture.alice, "alice's", None).await;

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();

    let lines = thread.lines(Some(fixture.alice));
    let affordance = |id: Uuid| {
        lines
            .iter()
            .find(|line| line.comment.id == id)
            .map(|line| line.affordances)
            .unwrap()
    };
    assert!(!affordance(c1.id).delete);
    assert!(affordance(c2.id).delete);
    assert!(affordance(c1.id).reply);

    let error = thread.delete(c1.id).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Forbidden);
    assert_eq!(fixture.store.calls(StoreOperation::Delete), 0);

    let error = thread.delete(Uuid::now_v7()).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn anonymous_viewer_gets_no_actions() {
    let fixture = Fixture::new();
    fixture.comment(fixture.bob, "c1", None).await;

    let mut thread = fixture.thread_as(None);
    thread.refresh().await.unwrap();

    let lines = thread.lines(None);
    assert!(!lines[0].affordances.reply);
    assert!(!lines[0].affordances.delete);
}

#[tokio::test]
async fn depth_guard_stops_expansion() {
    let fixture = Fixture::new();
    let mut chain = vec![fixture.comment(fixture.alice, "depth 0", None).await];
    for depth in 1..=MAX_REPLY_DEPTH + 1 {
        let parent_id = chain[depth - 1].id;
        let body = format!("depth {depth}");
        chain.push(fixture.comment(fixture.alice, &body, Some(parent_id)).await);
    }

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    for comment in &chain[..MAX_REPLY_DEPTH - 1] {
        thread.expand(comment.id).await.unwrap();
    }

    let below_guard = thread.node(chain[MAX_REPLY_DEPTH - 1].id).unwrap();
    assert_eq!(below_guard.depth(), MAX_REPLY_DEPTH - 1);
    assert!(below_guard.can_show_replies());

    thread.expand(chain[MAX_REPLY_DEPTH - 1].id).await.unwrap();
    let at_guard = thread.node(chain[MAX_REPLY_DEPTH].id).unwrap();
    assert_eq!(at_guard.depth(), MAX_REPLY_DEPTH);
    assert!(at_guard.comment().has_replies());
    assert!(!at_guard.can_show_replies());

    let line = thread
        .lines(Some(fixture.alice))
        .into_iter()
        .find(|line| line.depth == MAX_REPLY_DEPTH)
        .unwrap();
    assert!(!line.affordances.show_replies);

    let fetches = fixture.store.calls(StoreOperation::FetchReplies);
    let error = thread.request_expand(chain[MAX_REPLY_DEPTH].id).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(fixture.store.calls(StoreOperation::FetchReplies), fetches);
}

#[tokio::test]
async fn deleting_last_reply_hides_show_replies() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.bob, "C1", None).await;
    let r1 = fixture.comment(fixture.alice, "R1", Some(c1.id)).await;

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    assert!(matches!(thread.node(c1.id).unwrap().state(), NodeState::Collapsed));
    assert!(thread.lines(Some(fixture.alice))[0].affordances.show_replies);

    thread.expand(c1.id).await.unwrap();
    assert_eq!(thread.node(c1.id).unwrap().children().len(), 1);

    let mut events = thread.cache().subscribe();
    thread.delete(r1.id).await.unwrap();

    let mut invalidated = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CacheEvent::Invalidated(key) = event {
            invalidated.push(key);
        }
    }
    assert!(invalidated.contains(&CommentQuery::Replies { parent_id: c1.id }));
    assert!(invalidated.contains(&CommentQuery::TopLevel {
        post_id: fixture.post_id
    }));

    let node = thread.node(c1.id).unwrap();
    assert!(node.state().is_expanded());
    assert!(node.children().is_empty());
    assert_eq!(node.comment().reply_count, 0);

    let line = &thread.lines(Some(fixture.alice))[0];
    assert!(!line.affordances.show_replies);
    assert_eq!(thread.lines(None).len(), 1);
}

#[tokio::test]
async fn failed_expand_is_retriable() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    fixture.comment(fixture.bob, "reply", Some(c1.id)).await;

    let mut thread = fixture.thread_as(None);
    thread.refresh().await.unwrap();

    fixture.store.set_failing(StoreOperation::FetchReplies, true);
    let error = thread.expand(c1.id).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DataAccess);

    let node = thread.node(c1.id).unwrap();
    assert!(matches!(node.state(), NodeState::CollapsedWithError(_)));
    assert!(node.can_show_replies());

    fixture.store.set_failing(StoreOperation::FetchReplies, false);
    thread.expand(c1.id).await.unwrap();
    assert_eq!(thread.node(c1.id).unwrap().children().len(), 1);
}

#[tokio::test]
async fn late_replies_after_collapse_are_ignored() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    fixture.comment(fixture.bob, "reply", Some(c1.id)).await;

    let mut thread = fixture.thread_as(None);
    thread.refresh().await.unwrap();

    let load = thread.request_expand(c1.id).unwrap();
    thread.collapse(c1.id).unwrap();

    let result = load.await;
    assert!(result.is_ok());
    assert!(!thread.apply_replies(c1.id, result));
    assert!(matches!(thread.node(c1.id).unwrap().state(), NodeState::Collapsed));
    assert_eq!(thread.lines(None).len(), 1);
}

#[tokio::test]
async fn refresh_keeps_expansion_of_surviving_comments() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    let r1 = fixture.comment(fixture.bob, "r1", Some(c1.id)).await;
    fixture.comment(fixture.alice, "r1-a", Some(r1.id)).await;

    let mut thread = fixture.thread_as(None);
    thread.refresh().await.unwrap();
    thread.expand(c1.id).await.unwrap();
    thread.expand(r1.id).await.unwrap();

    fixture.comment(fixture.bob, "late", None).await;
    fixture.comment(fixture.bob, "r1-b", Some(r1.id)).await;
    thread.refresh().await.unwrap();

    assert_eq!(
        bodies(&thread),
        [
            (0, "c1".to_owned()),
            (1, "r1".to_owned()),
            (2, "r1-a".to_owned()),
            (2, "r1-b".to_owned()),
            (0, "late".to_owned()),
        ]
    );
}

#[tokio::test]
async fn top_level_failure_is_reported() {
    let fixture = Fixture::new();
    fixture.store.set_failing(StoreOperation::FetchTopLevel, true);

    let mut thread = fixture.thread_as(None);
    let error = thread.refresh().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DataAccess);
    assert!(thread.top_level_error().is_some());

    fixture.store.set_failing(StoreOperation::FetchTopLevel, false);
    thread.refresh().await.unwrap();
    assert!(thread.top_level_error().is_none());
}

#[tokio::test]
async fn deleting_a_comment_removes_its_subtree() {
    let fixture = Fixture::new();
    let c1 = fixture.comment(fixture.alice, "c1", None).await;
    let r1 = fixture.comment(fixture.bob, "r1", Some(c1.id)).await;
    fixture.comment(fixture.bob, "r1-a", Some(r1.id)).await;

    let mut thread = fixture.thread_as(Some(fixture.alice));
    thread.refresh().await.unwrap();
    thread.expand(c1.id).await.unwrap();
    thread.delete(c1.id).await.unwrap();

    assert!(thread.roots().is_empty());
    assert!(fixture.store.comments().is_empty());
}
