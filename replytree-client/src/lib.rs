mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

mod config;
pub use config::{Session, ThreadConfig};

mod cursor;
pub use cursor::{Cursor, Mount, Ticket};

mod draft;
pub use draft::{EditDraft, ReplyDraft, ReviewDraft};

mod entry;
pub use entry::{CommentEntry, Outcome};

mod expansion;
pub use expansion::{deep_link_target, ExpansionPath, PathCursor};

mod highlight;
pub use highlight::Highlight;

mod node;
pub use node::{Children, ChildrenStrategy, Ctx, NodeState, ReplyNode, Slot};

mod review_list;
pub use review_list::{EligibilityState, Notice, ReviewList, ToastKind};

mod tests;

pub mod api {
    pub use replytree_api::*;
}
