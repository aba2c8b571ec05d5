//! Fixture records and their composite keys.
//!
//! Records serialize to the exact item shape written to the store and to the
//! snapshot file: `PK`, `SK`, `__typename`, then camelCase attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MOVIE_PREFIX: &str = "MOVIE#";
pub const USER_PREFIX: &str = "USER#";
pub const LIST_PREFIX: &str = "LIST#";

/// Entity discriminator (`__typename`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Movie,
    User,
    Review,
    List,
    Association,
    Follow,
}

impl EntityKind {
    /// Generation order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Movie,
        EntityKind::User,
        EntityKind::Review,
        EntityKind::List,
        EntityKind::Association,
        EntityKind::Follow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Movie => "MOVIE",
            EntityKind::User => "USER",
            EntityKind::Review => "REVIEW",
            EntityKind::List => "LIST",
            EntityKind::Association => "ASSOCIATION",
            EntityKind::Follow => "FOLLOW",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(PK, SK)` identity plus the kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    #[serde(rename = "PK")]
    pub partition_key: String,
    #[serde(rename = "SK")]
    pub sort_key: String,
    #[serde(rename = "__typename")]
    pub kind: EntityKind,
}

impl EntityKey {
    pub fn new(kind: EntityKind, partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
            kind,
        }
    }

    /// Key whose partition and sort components are the same string.
    pub fn singleton(kind: EntityKind, id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(kind, id.clone(), id)
    }
}

/// Replace every non-word character (anything but `[A-Za-z0-9_]`) with `-`.
///
/// Collisions are tolerated; two titles that slug to the same string address
/// the same item and the later write wins.
pub fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect()
}

/// Anything addressable by a composite key.
pub trait Record {
    fn key(&self) -> &EntityKey;

    fn partition_key(&self) -> &str {
        &self.key().partition_key
    }

    fn sort_key(&self) -> &str {
        &self.key().sort_key
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(flatten)]
    pub key: EntityKey,
    pub title: String,
    pub release_date: DateTime<Utc>,
    pub director: String,
    pub lists_count: u64,
    pub reviews_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub key: EntityKey,
    pub email: String,
    pub name: String,
    pub bio: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub reviews_count: u64,
    pub lists_count: u64,
    pub likes_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// `PK = User.PK`, `SK = Movie.PK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(flatten)]
    pub key: EntityKey,
    pub rating: u8,
    pub description: String,
    pub likes_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// `PK = User.PK` (owner), `SK = LIST#<slug(name)>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(flatten)]
    pub key: EntityKey,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// List membership: `PK = List.SK`, `SK = Movie.PK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    #[serde(flatten)]
    pub key: EntityKey,
    pub updated_at: DateTime<Utc>,
}

/// Directed follow edge: `PK = follower.PK`, `SK = followee.PK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(flatten)]
    pub key: EntityKey,
    pub updated_at: DateTime<Utc>,
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                fn key(&self) -> &EntityKey {
                    &self.key
                }
            }
        )*
    };
}

impl_record!(Movie, User, Review, List, Association, Relationship);

/// Borrowed view over any record, serialized without a wrapper.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum EntityRef<'a> {
    Movie(&'a Movie),
    User(&'a User),
    Review(&'a Review),
    List(&'a List),
    Association(&'a Association),
    Relationship(&'a Relationship),
}

impl Record for EntityRef<'_> {
    fn key(&self) -> &EntityKey {
        match self {
            EntityRef::Movie(r) => &r.key,
            EntityRef::User(r) => &r.key,
            EntityRef::Review(r) => &r.key,
            EntityRef::List(r) => &r.key,
            EntityRef::Association(r) => &r.key,
            EntityRef::Relationship(r) => &r.key,
        }
    }
}
