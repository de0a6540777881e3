//! Reconstruction of nested event graphs from flat join rows.
//!
//! The event queries return one row per (event, member) pair. The event and
//! owner columns repeat on every row, and an optional like tuple and an
//! optional photo tuple ride along, repeating once per member row they
//! coincide with. [`aggregate`] folds such a sequence into one [`Event`] per
//! event id in a single forward pass:
//!
//! - likes and photos are deduplicated by id across the whole result set;
//! - members are appended once per row and are never deduplicated;
//! - events keep the order in which they were first seen.
//!
//! The fold works on owned [`EventBuilder`]s held in an index keyed by event
//! id; the immutable [`Event`]s only exist once the input is exhausted.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{EntityId, LikeId, Timestamp};

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A user as embedded in an event (owner or member).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: EntityId,
    /// Provider-scoped subject the account was created from.
    pub oauth_id: String,
    pub name: String,
    pub avatar_url: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Like {
    pub id: LikeId,
    pub user_id: EntityId,
    pub event_id: EntityId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: EntityId,
    pub public_url: String,
    pub file_name: String,
    pub file_type: String,
    pub created_by: EntityId,
    pub event_id: EntityId,
    pub created_at: Timestamp,
}

/// Scalar event columns carried by every flat row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHead {
    pub id: EntityId,
    pub name: String,
    pub created_at: Timestamp,
    pub owner_id: EntityId,
    pub image_url: Option<String>,
}

/// A fully populated event aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: EntityId,
    pub name: String,
    pub created_at: Timestamp,
    pub owner_id: EntityId,
    pub image_url: Option<String>,
    pub owner: User,
    /// Unique by like id.
    pub likes: Vec<Like>,
    /// One entry per source row, in row order.
    pub members: Vec<User>,
    /// Unique by photo id.
    pub photos: Vec<Photo>,
}

/// One row of the denormalized event join.
///
/// `like` and `photo` are optional tuples: decoding code must produce `None`
/// only when every column of the tuple is null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub event: EventHead,
    pub owner: User,
    pub like: Option<Like>,
    pub photo: Option<Photo>,
    pub member: User,
}

/// A flat row that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("required column `{column}` is null")]
    MissingColumn { column: &'static str },

    #[error("partial {entity} tuple: `{present}` is set but `{missing}` is null")]
    PartialTuple {
        entity: &'static str,
        present: &'static str,
        missing: &'static str,
    },

    #[error("undecodable row: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

/// Growable, owned state for one event while rows are still arriving.
#[derive(Debug)]
pub struct EventBuilder {
    head: EventHead,
    owner: User,
    likes: Vec<Like>,
    members: Vec<User>,
    photos: Vec<Photo>,
}

impl EventBuilder {
    fn new(head: EventHead, owner: User) -> Self {
        Self {
            head,
            owner,
            likes: Vec::new(),
            members: Vec::new(),
            photos: Vec::new(),
        }
    }

    fn build(self) -> Event {
        let EventHead {
            id,
            name,
            created_at,
            owner_id,
            image_url,
        } = self.head;

        Event {
            id,
            name,
            created_at,
            owner_id,
            image_url,
            owner: self.owner,
            likes: self.likes,
            members: self.members,
            photos: self.photos,
        }
    }
}

/// Incremental form of [`aggregate`], for callers that decode rows one at a
/// time.
#[derive(Debug, Default)]
pub struct EventAggregator {
    events: IndexMap<EntityId, EventBuilder>,
    seen_likes: HashSet<LikeId>,
    seen_photos: HashSet<EntityId>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one row into the graph.
    pub fn push(&mut self, row: FlatRow) {
        let FlatRow {
            event,
            owner,
            like,
            photo,
            member,
        } = row;

        let builder = self
            .events
            .entry(event.id)
            .or_insert_with(|| EventBuilder::new(event, owner));

        if let Some(like) = like {
            if self.seen_likes.insert(like.id) {
                builder.likes.push(like);
            }
        }

        if let Some(photo) = photo {
            if self.seen_photos.insert(photo.id) {
                builder.photos.push(photo);
            }
        }

        builder.members.push(member);
    }

    /// Number of distinct events seen so far.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Finalize every builder, keeping first-seen order.
    pub fn finish(self) -> IndexMap<EntityId, Event> {
        self.events
            .into_iter()
            .map(|(id, builder)| (id, builder.build()))
            .collect()
    }
}

/// Fold a row sequence into `event id -> Event`.
///
/// All-or-nothing: the first undecodable row aborts the fold and everything
/// aggregated so far is dropped.
pub fn aggregate<I>(rows: I) -> Result<IndexMap<EntityId, Event>, ScanError>
where
    I: IntoIterator<Item = Result<FlatRow, ScanError>>,
{
    let mut aggregator = EventAggregator::new();
    for row in rows {
        aggregator.push(row?);
    }
    Ok(aggregator.finish())
}

/// Flatten an aggregate map into a list ordered by `created_at`, newest first.
pub fn newest_first(events: IndexMap<EntityId, Event>) -> Vec<Event> {
    let mut list: Vec<Event> = events.into_values().collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list
}
