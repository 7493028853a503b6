use crate::{
    api::{Comment, CommentId, EditComment, Error, NewReply, Time},
    Ctx, EditDraft, Highlight, Mount, PathCursor, ReplyDraft, Session,
};

/// What became of a user action that passed through the network layer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The server accepted it
    Done,

    /// Nothing to send (empty draft, no pending confirmation...), no request issued
    Skipped,
}

/// One displayed comment with everything a user can do to it besides
/// opening its replies. Flattened descendants are bare entries.
#[derive(Clone, Debug)]
pub struct CommentEntry {
    comment: Comment,
    reply: Option<ReplyDraft>,
    edit: Option<EditDraft>,
    confirming_delete: bool,
    highlight: Option<Highlight>,
}

impl CommentEntry {
    pub(crate) fn mount(comment: Comment, path: Option<PathCursor>, ctx: &Ctx) -> CommentEntry {
        let highlight = match (&ctx.expansion, path) {
            (Some(p), Some(cursor)) if cursor.is_target(p, comment.id) => {
                tracing::debug!(comment = %comment.id, "deep link target mounted");
                Some(Highlight::start(
                    ctx.clock.now(),
                    ctx.config.highlight_duration_ms,
                ))
            }
            _ => None,
        };
        CommentEntry {
            comment,
            reply: None,
            edit: None,
            confirming_delete: false,
            highlight,
        }
    }

    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn can_modify(&self, session: &Session) -> bool {
        self.comment.is_owned_by(session.username())
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn is_highlighted(&self, now: Time) -> bool {
        self.highlight.map(|h| h.is_active(now)).unwrap_or(false)
    }

    pub fn reply_draft(&self) -> Option<&ReplyDraft> {
        self.reply.as_ref()
    }

    pub fn edit_draft(&self) -> Option<&EditDraft> {
        self.edit.as_ref()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub fn start_reply(&mut self) {
        if self.reply.is_none() {
            self.reply = Some(ReplyDraft::for_author(&self.comment.author_display_name));
        }
    }

    pub fn set_reply_text(&mut self, text: &str) {
        self.start_reply();
        if let Some(d) = &mut self.reply {
            d.set_text(text);
        }
    }

    pub fn cancel_reply(&mut self) {
        self.reply = None;
    }

    pub fn start_edit(&mut self) {
        self.edit = Some(EditDraft {
            text: String::from(self.comment.content()),
        });
    }

    pub fn set_edit_text(&mut self, text: &str) {
        match &mut self.edit {
            Some(d) => d.text = String::from(text),
            None => {
                self.edit = Some(EditDraft {
                    text: String::from(text),
                })
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    pub fn request_delete(&mut self) {
        self.confirming_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    /// Post the reply draft. On success the draft is cleared; it is up to
    /// the caller to reload whatever listing the reply lands in.
    pub async fn submit_reply(&mut self, ctx: &Ctx) -> Result<Outcome, Error> {
        let content = match self.reply.as_ref().and_then(|d| d.submission()) {
            Some(content) => content,
            None => return Ok(Outcome::Skipped),
        };
        let user = ctx.session.username().ok_or(Error::PermissionDenied)?;
        let reply = NewReply {
            parent_comment_id: self.comment.id,
            product_id: self.comment.product_id,
            content,
        };
        let posted = ctx.api.post_reply(reply, user).await?;
        tracing::info!(parent = %self.comment.id, reply = %posted.id, "posted reply");
        self.reply = None;
        Ok(Outcome::Done)
    }

    /// Save the edit draft. The displayed text is not patched locally, the
    /// holding listing has to be reloaded.
    pub async fn submit_edit(&mut self, ctx: &Ctx) -> Result<Outcome, Error> {
        let content = match self.edit.as_ref().and_then(|d| d.submission()) {
            Some(content) => content,
            None => return Ok(Outcome::Skipped),
        };
        let user = ctx.session.username().ok_or(Error::PermissionDenied)?;
        ctx.api
            .edit_comment(self.comment.id, EditComment { content }, user)
            .await?;
        tracing::info!(comment = %self.comment.id, "edited comment");
        self.edit = None;
        Ok(Outcome::Done)
    }

    pub async fn confirm_delete(&mut self, ctx: &Ctx) -> Result<Outcome, Error> {
        if !self.confirming_delete {
            return Ok(Outcome::Skipped);
        }
        let user = ctx.session.username().ok_or(Error::PermissionDenied)?;
        ctx.api.delete_comment(self.comment.id, user).await?;
        tracing::info!(comment = %self.comment.id, "deleted comment");
        self.confirming_delete = false;
        Ok(Outcome::Done)
    }
}

impl Mount for CommentEntry {
    fn key(&self) -> CommentId {
        self.comment.id
    }

    fn update(&mut self, comment: Comment) {
        self.comment = comment;
    }
}
