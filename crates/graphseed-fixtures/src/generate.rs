//! Entity generators.
//!
//! Each generator returns records in generation order. Generators that link to
//! other entities copy key components from the slices they are handed, so a
//! reference always points at a record generated earlier in the same run.
//!
//! `generate_associations` and `generate_relationships` evaluate every pair
//! (`|lists| x |movies|` and `|users|^2`); callers bound them through
//! [`crate::ScaleConfig::check_pair_budget`].

use chrono::Utc;
use rand::Rng;

use crate::fields::FieldGenerator;
use crate::model::{
    slug, Association, EntityKey, EntityKind, List, Movie, Record, Relationship, Review, User,
    LIST_PREFIX, MOVIE_PREFIX, USER_PREFIX,
};

/// Percent chance that a given (list, movie) pair becomes an association.
pub const ASSOCIATION_LIKELIHOOD: u8 = 30;

/// Percent chance that a given ordered (user, user) pair becomes a follow.
pub const FOLLOW_LIKELIHOOD: u8 = 50;

/// Upper bounds for the decorative counters on movies and users.
///
/// These are sampled independently of the related collections; they are
/// scale hints, not aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecorativeBounds {
    pub movies: usize,
    pub lists: usize,
    pub reviews: usize,
    pub relationships: usize,
}

pub fn generate_movies<R: Rng>(
    fields: &mut FieldGenerator<R>,
    count: usize,
    bounds: &DecorativeBounds,
) -> Vec<Movie> {
    (0..count)
        .map(|_| {
            let title = format!(
                "The {} in {} {}",
                fields.animal(),
                fields.city(),
                fields.integer(1, 100)
            );
            let now = Utc::now();
            Movie {
                key: EntityKey::singleton(EntityKind::Movie, format!("{MOVIE_PREFIX}{}", slug(&title))),
                release_date: fields.date_until(now),
                director: fields.name(),
                lists_count: fields.count_up_to(bounds.lists as i64 - 1),
                reviews_count: fields.count_up_to(bounds.reviews as i64 - 1),
                updated_at: now,
                title,
            }
        })
        .collect()
}

pub fn generate_users<R: Rng>(
    fields: &mut FieldGenerator<R>,
    count: usize,
    bounds: &DecorativeBounds,
) -> Vec<User> {
    (0..count)
        .map(|_| {
            let email = format!("{}{}", fields.integer(0, 10_000), fields.email());
            User {
                key: EntityKey::singleton(EntityKind::User, format!("{USER_PREFIX}{email}")),
                name: fields.name(),
                bio: fields.sentence(None, true),
                followers_count: fields.count_up_to(bounds.relationships as i64),
                following_count: fields.count_up_to(bounds.relationships as i64),
                reviews_count: fields.count_up_to(bounds.movies as i64 - 1),
                lists_count: fields.count_up_to(bounds.lists as i64),
                likes_count: fields.count_up_to(bounds.reviews as i64 - 1),
                updated_at: Utc::now(),
                email,
            }
        })
        .collect()
}

/// `count` reviews, each for a uniformly sampled (user, movie) pair.
///
/// Pairs may repeat; the later review overwrites the earlier one on load.
pub fn generate_reviews<R: Rng>(
    fields: &mut FieldGenerator<R>,
    count: usize,
    users: &[User],
    movies: &[Movie],
) -> Vec<Review> {
    if users.is_empty() || movies.is_empty() {
        return Vec::new();
    }

    let mut reviews = Vec::with_capacity(count);
    for _ in 0..count {
        let (Some(user), Some(movie)) = (fields.pick(users), fields.pick(movies)) else {
            break;
        };
        reviews.push(Review {
            key: EntityKey::new(EntityKind::Review, user.partition_key(), movie.partition_key()),
            rating: fields.integer(1, 10) as u8,
            description: fields.sentence(None, true),
            likes_count: fields.count_up_to(users.len() as i64 - 1),
            updated_at: Utc::now(),
        });
    }
    reviews
}

/// `count` lists, each owned by a uniformly sampled user.
pub fn generate_lists<R: Rng>(
    fields: &mut FieldGenerator<R>,
    count: usize,
    users: &[User],
) -> Vec<List> {
    if users.is_empty() {
        return Vec::new();
    }

    let mut lists = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(owner) = fields.pick(users) else {
            break;
        };
        let name = format!(
            "{} {}",
            fields.sentence(Some(10), false),
            fields.integer(0, 10_000)
        );
        lists.push(List {
            key: EntityKey::new(
                EntityKind::List,
                owner.partition_key(),
                format!("{LIST_PREFIX}{}", slug(&name)),
            ),
            name,
            updated_at: Utc::now(),
        });
    }
    lists
}

/// One Bernoulli trial per (list, movie) pair.
pub fn generate_associations<R: Rng>(
    fields: &mut FieldGenerator<R>,
    lists: &[List],
    movies: &[Movie],
) -> Vec<Association> {
    let mut associations = Vec::new();
    for list in lists {
        for movie in movies {
            if fields.boolean(ASSOCIATION_LIKELIHOOD) {
                associations.push(Association {
                    key: EntityKey::new(
                        EntityKind::Association,
                        list.sort_key(),
                        movie.partition_key(),
                    ),
                    updated_at: Utc::now(),
                });
            }
        }
    }
    associations
}

/// One Bernoulli trial per ordered pair of distinct users.
///
/// Pairs whose keys collide are skipped too, so no edge ever has `PK == SK`.
pub fn generate_relationships<R: Rng>(
    fields: &mut FieldGenerator<R>,
    users: &[User],
) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    for (i, follower) in users.iter().enumerate() {
        for (j, followee) in users.iter().enumerate() {
            if i == j || follower.partition_key() == followee.partition_key() {
                continue;
            }
            if fields.boolean(FOLLOW_LIKELIHOOD) {
                relationships.push(Relationship {
                    key: EntityKey::new(
                        EntityKind::Follow,
                        follower.partition_key(),
                        followee.partition_key(),
                    ),
                    updated_at: Utc::now(),
                });
            }
        }
    }
    relationships
}
