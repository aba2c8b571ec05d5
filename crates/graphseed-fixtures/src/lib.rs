//! Graphseed fixtures
//!
//! Synthetic, internally consistent data for a movie/user/review graph:
//!
//! ```text
//!   Movie ◄──────── Review ────────► User ◄──── Relationship (follow) ───► User
//!     ▲                                ▲
//!     │                                │ owner
//!  Association ──────────────────► List
//! ```
//!
//! - [`fields`]: random scalar values (names, sentences, dates, ranges)
//! - [`generate`]: one generator per entity kind
//! - [`Dataset`]: generation order, derived scale, and the snapshot file

pub mod dataset;
pub mod error;
pub mod fields;
pub mod generate;
pub mod model;

pub use dataset::{Dataset, DerivedScale, ScaleConfig, DEFAULT_MAX_PAIR_EVALUATIONS};
pub use error::FixtureError;
pub use fields::FieldGenerator;
pub use generate::DecorativeBounds;
pub use model::{
    slug, Association, EntityKey, EntityKind, EntityRef, List, Movie, Record, Relationship,
    Review, User, LIST_PREFIX, MOVIE_PREFIX, USER_PREFIX,
};
