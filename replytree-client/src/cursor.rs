use std::collections::HashMap;

use crate::api::{Comment, CommentId, Page};

/// Something a cursor can hold: built once from a comment, then kept alive
/// across refreshes as long as the server keeps returning the same id.
pub trait Mount {
    fn key(&self) -> CommentId;
    fn update(&mut self, comment: Comment);
}

/// Proof that a page request was issued. Handed back to `Cursor::finish`
/// (or `Cursor::abandon`) once the response is in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ticket {
    page: u32,
    generation: u64,
}

impl Ticket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Accumulated pages of one listing (the replies of a single node)
#[derive(Clone, Debug)]
pub struct Cursor<T> {
    items: Vec<T>,
    next_page: u32,
    has_more: bool,

    // Every ticket gets a fresh generation. Anything issued before the latest
    // page-0 request belongs to a superseded listing.
    generation: u64,
    reset_generation: u64,
    in_flight: usize,
}

impl<T> Default for Cursor<T> {
    fn default() -> Self {
        Cursor {
            items: Vec::new(),
            next_page: 0,
            has_more: true,
            generation: 0,
            reset_generation: 0,
            in_flight: 0,
        }
    }
}

impl<T: Mount> Cursor<T> {
    pub fn new() -> Cursor<T> {
        Cursor::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Start loading page `page`. Returns None when the request is pointless:
    /// the listing is exhausted, or `page` is not the next one to append.
    /// Page 0 is always allowed, and forces `has_more` back on.
    pub fn begin(&mut self, page: u32) -> Option<Ticket> {
        if page > 0 && !self.has_more {
            tracing::debug!(page, "listing exhausted, not loading more");
            return None;
        }
        if page > 0 && page != self.next_page {
            tracing::debug!(
                page,
                next_page = self.next_page,
                "refusing to load a page that would not be appended in order"
            );
            return None;
        }
        self.generation += 1;
        if page == 0 {
            self.reset_generation = self.generation;
            self.has_more = true;
        }
        self.in_flight += 1;
        Some(Ticket {
            page,
            generation: self.generation,
        })
    }

    /// The request for `ticket` failed: nothing changes besides the loading
    /// indicator
    pub fn abandon(&mut self, _ticket: Ticket) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Apply the response to `ticket`. Page 0 replaces the listing, keeping
    /// the local state of items whose id survived; later pages append.
    /// Returns false if the response was stale and got discarded.
    pub fn finish<F>(&mut self, ticket: Ticket, page: Page<Comment>, mut mount: F) -> bool
    where
        F: FnMut(Comment) -> T,
    {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ticket.generation < self.reset_generation {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                latest_reset = self.reset_generation,
                "discarding response to a superseded request"
            );
            return false;
        }
        if ticket.page == 0 {
            let mut previous = self
                .items
                .drain(..)
                .map(|i| (i.key(), i))
                .collect::<HashMap<_, _>>();
            self.items = page
                .content
                .into_iter()
                .map(|c| match previous.remove(&c.id) {
                    Some(mut item) => {
                        item.update(c);
                        item
                    }
                    None => mount(c),
                })
                .collect();
        } else {
            if ticket.page != self.next_page {
                tracing::debug!(
                    page = ticket.page,
                    next_page = self.next_page,
                    "discarding out-of-order page"
                );
                return false;
            }
            for c in page.content {
                if self.items.iter().any(|i| i.key() == c.id) {
                    tracing::debug!(comment = %c.id, "comment already listed, skipping it");
                    continue;
                }
                self.items.push(mount(c));
            }
        }
        self.next_page = ticket.page + 1;
        self.has_more = !page.last;
        true
    }
}
