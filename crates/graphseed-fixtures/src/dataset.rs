//! Dataset assembly and the snapshot file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FixtureError;
use crate::fields::FieldGenerator;
use crate::generate::{
    generate_associations, generate_lists, generate_movies, generate_relationships,
    generate_reviews, generate_users, DecorativeBounds,
};
use crate::model::{
    Association, EntityKind, EntityRef, List, Movie, Relationship, Review, User,
};

/// Default ceiling on pair evaluations per run.
pub const DEFAULT_MAX_PAIR_EVALUATIONS: usize = 10_000_000;

/// Base counts for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConfig {
    pub movies: usize,
    pub users: usize,
    pub lists: usize,
    /// Upper bound on `lists * movies + users * users + movies * users`.
    pub max_pair_evaluations: usize,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            movies: 60,
            users: 100,
            lists: 50,
            max_pair_evaluations: DEFAULT_MAX_PAIR_EVALUATIONS,
        }
    }
}

impl ScaleConfig {
    pub fn new(movies: usize, users: usize, lists: usize) -> Self {
        Self {
            movies,
            users,
            lists,
            ..Self::default()
        }
    }

    /// Pairs visited by the association and relationship generators, plus
    /// the largest review count that can be sampled.
    pub fn pair_evaluations(&self) -> usize {
        self.lists
            .saturating_mul(self.movies)
            .saturating_add(self.users.saturating_mul(self.users))
            .saturating_add(self.movies.saturating_mul(self.users))
    }

    pub fn check_pair_budget(&self) -> Result<(), FixtureError> {
        let requested = self.pair_evaluations();
        if requested > self.max_pair_evaluations {
            return Err(FixtureError::PairBudgetExceeded {
                requested,
                limit: self.max_pair_evaluations,
            });
        }
        Ok(())
    }
}

/// Counts derived from a [`ScaleConfig`] by sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedScale {
    /// Number of reviews to generate, uniform in `[m*u/10, m*u]`.
    pub reviews: usize,
    /// Decorative bound for follower counters, uniform in `[u^2/10, u^2 - u]`.
    ///
    /// The number of relationships actually generated comes from per-pair
    /// sampling and is unrelated to this value.
    pub relationships_bound: usize,
}

impl DerivedScale {
    pub fn sample<R: Rng>(fields: &mut FieldGenerator<R>, scale: &ScaleConfig) -> Self {
        let pairs = scale.movies.saturating_mul(scale.users) as i64;
        let reviews = fields.integer(pairs / 10, pairs);

        let users = scale.users as i64;
        let squared = users.saturating_mul(users);
        let relationships_bound = fields.integer(squared / 10, squared - users);

        Self {
            reviews: reviews.max(0) as usize,
            relationships_bound: relationships_bound.max(0) as usize,
        }
    }
}

/// Every generated entity, grouped by kind. Also the snapshot file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub users: Vec<User>,
    pub reviews: Vec<Review>,
    pub lists: Vec<List>,
    pub associations: Vec<Association>,
    pub relationships: Vec<Relationship>,
}

impl Dataset {
    /// Generate all six entity kinds in dependency order.
    pub fn generate<R: Rng>(rng: R, scale: &ScaleConfig) -> Result<Self, FixtureError> {
        scale.check_pair_budget()?;

        let mut fields = FieldGenerator::new(rng);
        let derived = DerivedScale::sample(&mut fields, scale);
        let bounds = DecorativeBounds {
            movies: scale.movies,
            lists: scale.lists,
            reviews: derived.reviews,
            relationships: derived.relationships_bound,
        };
        debug!(?scale, ?derived, "generating dataset");

        let movies = generate_movies(&mut fields, scale.movies, &bounds);
        let users = generate_users(&mut fields, scale.users, &bounds);
        let reviews = generate_reviews(&mut fields, derived.reviews, &users, &movies);
        let lists = generate_lists(&mut fields, scale.lists, &users);
        let associations = generate_associations(&mut fields, &lists, &movies);
        let relationships = generate_relationships(&mut fields, &users);

        let dataset = Self {
            movies,
            users,
            reviews,
            lists,
            associations,
            relationships,
        };
        info!(
            movies = dataset.movies.len(),
            users = dataset.users.len(),
            reviews = dataset.reviews.len(),
            lists = dataset.lists.len(),
            associations = dataset.associations.len(),
            relationships = dataset.relationships.len(),
            "dataset generated"
        );
        Ok(dataset)
    }

    /// Reproducible generation from a fixed seed.
    pub fn seeded(seed: u64, scale: &ScaleConfig) -> Result<Self, FixtureError> {
        Self::generate(StdRng::seed_from_u64(seed), scale)
    }

    /// Records of one kind, in generation order.
    pub fn records(&self, kind: EntityKind) -> Vec<EntityRef<'_>> {
        match kind {
            EntityKind::Movie => self.movies.iter().map(EntityRef::Movie).collect(),
            EntityKind::User => self.users.iter().map(EntityRef::User).collect(),
            EntityKind::Review => self.reviews.iter().map(EntityRef::Review).collect(),
            EntityKind::List => self.lists.iter().map(EntityRef::List).collect(),
            EntityKind::Association => {
                self.associations.iter().map(EntityRef::Association).collect()
            }
            EntityKind::Follow => self.relationships.iter().map(EntityRef::Relationship).collect(),
        }
    }

    /// Every record, kinds concatenated in generation order.
    pub fn combined(&self) -> Vec<EntityRef<'_>> {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| self.records(*kind))
            .collect()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Movie => self.movies.len(),
            EntityKind::User => self.users.len(),
            EntityKind::Review => self.reviews.len(),
            EntityKind::List => self.lists.len(),
            EntityKind::Association => self.associations.len(),
            EntityKind::Follow => self.relationships.len(),
        }
    }

    pub fn total_len(&self) -> usize {
        EntityKind::ALL.iter().map(|kind| self.len(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<(), FixtureError> {
        let file = File::create(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), records = self.total_len(), "snapshot written");
        Ok(())
    }

    pub fn read_snapshot(path: &Path) -> Result<Self, FixtureError> {
        let file = File::open(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset: Self = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), records = dataset.total_len(), "snapshot read");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, MOVIE_PREFIX, USER_PREFIX};

    #[test]
    fn test_empty_scale_yields_empty_dataset() {
        let dataset = Dataset::seeded(1, &ScaleConfig::new(0, 0, 0)).unwrap();
        assert!(dataset.is_empty());
        for kind in EntityKind::ALL {
            assert!(dataset.records(kind).is_empty());
        }
        assert!(dataset.combined().is_empty());
    }

    #[test]
    fn test_zero_movies_with_users_still_generates_users() {
        let dataset = Dataset::seeded(2, &ScaleConfig::new(0, 3, 2)).unwrap();
        assert_eq!(dataset.users.len(), 3);
        assert_eq!(dataset.lists.len(), 2);
        assert!(dataset.movies.is_empty());
        assert!(dataset.reviews.is_empty());
        assert!(dataset.associations.is_empty());
    }

    #[test]
    fn test_seeded_small_dataset_references_only_seeded_keys() {
        let dataset = Dataset::seeded(42, &ScaleConfig::new(2, 2, 1)).unwrap();
        assert_eq!(dataset.movies.len(), 2);
        assert_eq!(dataset.users.len(), 2);
        assert_eq!(dataset.lists.len(), 1);
        assert!(dataset.movies.iter().all(|m| m.partition_key().starts_with(MOVIE_PREFIX)));
        assert!(dataset.users.iter().all(|u| u.partition_key().starts_with(USER_PREFIX)));

        let movie_keys: Vec<_> = dataset.movies.iter().map(|m| m.partition_key()).collect();
        let user_keys: Vec<_> = dataset.users.iter().map(|u| u.partition_key()).collect();
        let list_keys: Vec<_> = dataset.lists.iter().map(|l| l.sort_key()).collect();

        assert!((0..=4).contains(&dataset.reviews.len()));
        for r in &dataset.reviews {
            assert!(user_keys.contains(&r.partition_key()));
            assert!(movie_keys.contains(&r.sort_key()));
        }
        for l in &dataset.lists {
            assert!(user_keys.contains(&l.partition_key()));
        }
        for a in &dataset.associations {
            assert!(list_keys.contains(&a.partition_key()));
            assert!(movie_keys.contains(&a.sort_key()));
        }
        for f in &dataset.relationships {
            assert!(user_keys.contains(&f.partition_key()));
            assert!(user_keys.contains(&f.sort_key()));
        }
    }

    #[test]
    fn test_same_seed_reproduces_keys() {
        let scale = ScaleConfig::new(4, 3, 2);
        let a = Dataset::seeded(9, &scale).unwrap();
        let b = Dataset::seeded(9, &scale).unwrap();
        let keys = |d: &Dataset| {
            d.combined()
                .iter()
                .map(|r| r.key().clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&a), keys(&b));
    }

    #[test]
    fn test_derived_scale_ranges() {
        let mut fields = FieldGenerator::new(StdRng::seed_from_u64(3));
        let scale = ScaleConfig::new(30, 20, 10);
        for _ in 0..100 {
            let derived = DerivedScale::sample(&mut fields, &scale);
            assert!((60..=600).contains(&derived.reviews));
            assert!((40..=380).contains(&derived.relationships_bound));
        }
        let derived = DerivedScale::sample(&mut fields, &ScaleConfig::new(0, 1, 0));
        assert_eq!(derived.reviews, 0);
        assert_eq!(derived.relationships_bound, 0);
    }

    #[test]
    fn test_pair_budget_is_enforced() {
        let scale = ScaleConfig {
            max_pair_evaluations: 10,
            ..ScaleConfig::new(5, 3, 1)
        };
        assert_eq!(scale.pair_evaluations(), 5 + 9 + 15);
        let err = Dataset::seeded(1, &scale).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::PairBudgetExceeded {
                requested: 29,
                limit: 10
            }
        ));
    }

    #[test]
    fn test_pair_budget_covers_review_count() {
        // No lists and few users, but movies * users reviews could be sampled.
        let scale = ScaleConfig::new(1_000_000, 1_000, 0);
        assert!(scale.pair_evaluations() > DEFAULT_MAX_PAIR_EVALUATIONS);
        assert!(matches!(
            scale.check_pair_budget(),
            Err(FixtureError::PairBudgetExceeded { requested: 1_001_000_000, .. })
        ));
    }

    #[test]
    fn test_combined_preserves_kind_order() {
        let dataset = Dataset::seeded(5, &ScaleConfig::new(3, 3, 2)).unwrap();
        let combined = dataset.combined();
        assert_eq!(combined.len(), dataset.total_len());

        let kinds: Vec<_> = combined.iter().map(|r| r.key().kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loaded-data.json");
        let dataset = Dataset::seeded(11, &ScaleConfig::new(3, 4, 2)).unwrap();
        dataset.write_snapshot(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for key in ["movies", "users", "reviews", "lists", "associations", "relationships"] {
            assert!(raw[key].is_array(), "missing {key}");
        }

        let back = Dataset::read_snapshot(&path).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn test_read_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::read_snapshot(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
