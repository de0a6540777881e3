//! Flat event-join rows and event DTOs.

use mercuria_core::event_graph::{EventHead, FlatRow, Like, Photo, ScanError, User};
use mercuria_core::types::{EntityId, LikeId, Timestamp};
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// One row returned by `get_events()`, `get_event($1)` and
/// `get_user_events($1)`.
///
/// The procedures' column names are not part of their contract, only the
/// order is, so [`FromRow`] reads by position:
///
/// | Position | Columns                                                        |
/// |----------|----------------------------------------------------------------|
/// | 0..=4    | event `id, name, created_at, owner, image_url`                 |
/// | 5..=9    | owner `id, oauth_id, name, avatar_url, email`                  |
/// | 10..=13  | like `id, user_id, event_id, created_at`                       |
/// | 14..=20  | photo `id, public_url, file_name, file_type, created_by, event_id, created_at` |
/// | 21..=25  | member `id, oauth_id, name, avatar_url, email`                 |
///
/// Every column is decoded as nullable; [`FlatRow::try_from`] decides which
/// nulls are legal. Owner and member columns are required, the like and photo
/// columns form optional tuples (all null or all set).
#[derive(Debug, Clone, Default)]
pub struct EventRow {
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub created_at: Option<Timestamp>,
    pub owner: Option<EntityId>,
    pub image_url: Option<String>,

    pub owner_id: Option<EntityId>,
    pub owner_oauth_id: Option<String>,
    pub owner_name: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub owner_email: Option<String>,

    pub like_id: Option<LikeId>,
    pub like_user_id: Option<EntityId>,
    pub like_event_id: Option<EntityId>,
    pub like_created_at: Option<Timestamp>,

    pub photo_id: Option<EntityId>,
    pub photo_public_url: Option<String>,
    pub photo_file_name: Option<String>,
    pub photo_file_type: Option<String>,
    pub photo_created_by: Option<EntityId>,
    pub photo_event_id: Option<EntityId>,
    pub photo_created_at: Option<Timestamp>,

    pub member_id: Option<EntityId>,
    pub member_oauth_id: Option<String>,
    pub member_name: Option<String>,
    pub member_avatar_url: Option<String>,
    pub member_email: Option<String>,
}

/// Number of columns an event row must carry.
pub const EVENT_ROW_WIDTH: usize = 26;

impl<'r> FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        if row.len() != EVENT_ROW_WIDTH {
            return Err(sqlx::Error::Decode(
                format!(
                    "event row has {} columns, expected {EVENT_ROW_WIDTH}",
                    row.len()
                )
                .into(),
            ));
        }

        Ok(Self {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
            created_at: row.try_get(2)?,
            owner: row.try_get(3)?,
            image_url: row.try_get(4)?,

            owner_id: row.try_get(5)?,
            owner_oauth_id: row.try_get(6)?,
            owner_name: row.try_get(7)?,
            owner_avatar_url: row.try_get(8)?,
            owner_email: row.try_get(9)?,

            like_id: row.try_get(10)?,
            like_user_id: row.try_get(11)?,
            like_event_id: row.try_get(12)?,
            like_created_at: row.try_get(13)?,

            photo_id: row.try_get(14)?,
            photo_public_url: row.try_get(15)?,
            photo_file_name: row.try_get(16)?,
            photo_file_type: row.try_get(17)?,
            photo_created_by: row.try_get(18)?,
            photo_event_id: row.try_get(19)?,
            photo_created_at: row.try_get(20)?,

            member_id: row.try_get(21)?,
            member_oauth_id: row.try_get(22)?,
            member_name: row.try_get(23)?,
            member_avatar_url: row.try_get(24)?,
            member_email: row.try_get(25)?,
        })
    }
}

/// DTO for `create_event($1, $2)`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub name: String,
    pub owner: EntityId,
}

fn required<T>(value: Option<T>, column: &'static str) -> Result<T, ScanError> {
    value.ok_or(ScanError::MissingColumn { column })
}

/// Build the error for a tuple that is neither fully null nor fully set.
fn partial_tuple(entity: &'static str, columns: &[(&'static str, bool)]) -> ScanError {
    let present = columns
        .iter()
        .find(|(_, set)| *set)
        .map_or("?", |(name, _)| *name);
    let missing = columns
        .iter()
        .find(|(_, set)| !*set)
        .map_or("?", |(name, _)| *name);
    ScanError::PartialTuple {
        entity,
        present,
        missing,
    }
}

impl EventRow {
    fn take_like(&mut self) -> Result<Option<Like>, ScanError> {
        match (
            self.like_id.take(),
            self.like_user_id.take(),
            self.like_event_id.take(),
            self.like_created_at.take(),
        ) {
            (None, None, None, None) => Ok(None),
            (Some(id), Some(user_id), Some(event_id), Some(created_at)) => Ok(Some(Like {
                id,
                user_id,
                event_id,
                created_at,
            })),
            (id, user_id, event_id, created_at) => Err(partial_tuple(
                "like",
                &[
                    ("like_id", id.is_some()),
                    ("like_user_id", user_id.is_some()),
                    ("like_event_id", event_id.is_some()),
                    ("like_created_at", created_at.is_some()),
                ],
            )),
        }
    }

    fn take_photo(&mut self) -> Result<Option<Photo>, ScanError> {
        let columns = [
            ("photo_id", self.photo_id.is_some()),
            ("photo_public_url", self.photo_public_url.is_some()),
            ("photo_file_name", self.photo_file_name.is_some()),
            ("photo_file_type", self.photo_file_type.is_some()),
            ("photo_created_by", self.photo_created_by.is_some()),
            ("photo_event_id", self.photo_event_id.is_some()),
            ("photo_created_at", self.photo_created_at.is_some()),
        ];

        if columns.iter().all(|(_, set)| !*set) {
            return Ok(None);
        }
        if !columns.iter().all(|(_, set)| *set) {
            return Err(partial_tuple("photo", &columns));
        }

        Ok(Some(Photo {
            id: required(self.photo_id.take(), "photo_id")?,
            public_url: required(self.photo_public_url.take(), "photo_public_url")?,
            file_name: required(self.photo_file_name.take(), "photo_file_name")?,
            file_type: required(self.photo_file_type.take(), "photo_file_type")?,
            created_by: required(self.photo_created_by.take(), "photo_created_by")?,
            event_id: required(self.photo_event_id.take(), "photo_event_id")?,
            created_at: required(self.photo_created_at.take(), "photo_created_at")?,
        }))
    }
}

impl TryFrom<EventRow> for FlatRow {
    type Error = ScanError;

    fn try_from(mut row: EventRow) -> Result<Self, Self::Error> {
        let like = row.take_like()?;
        let photo = row.take_photo()?;

        let event = EventHead {
            id: required(row.id, "id")?,
            name: required(row.name, "name")?,
            created_at: required(row.created_at, "created_at")?,
            owner_id: required(row.owner, "owner")?,
            image_url: row.image_url,
        };

        let owner = User {
            id: required(row.owner_id, "owner_id")?,
            oauth_id: required(row.owner_oauth_id, "owner_oauth_id")?,
            name: required(row.owner_name, "owner_name")?,
            avatar_url: required(row.owner_avatar_url, "owner_avatar_url")?,
            email: required(row.owner_email, "owner_email")?,
        };

        let member = User {
            id: required(row.member_id, "member_id")?,
            oauth_id: required(row.member_oauth_id, "member_oauth_id")?,
            name: required(row.member_name, "member_name")?,
            avatar_url: required(row.member_avatar_url, "member_avatar_url")?,
            email: required(row.member_email, "member_email")?,
        };

        Ok(FlatRow {
            event,
            owner,
            like,
            photo,
            member,
        })
    }
}
