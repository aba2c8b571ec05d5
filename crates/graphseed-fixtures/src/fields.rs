//! Randomized scalar fields shared by every entity generator.
//!
//! Outputs are arbitrary but always satisfy the requested constraint
//! (inclusive integer range, date not after `max`, word count, likelihood).
//! Determinism only comes from the injected RNG.

use chrono::{DateTime, Utc};
use fake::faker::address::en::CityName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;

const ANIMALS: &[&str] = &[
    "Aardvark",
    "Albatross",
    "Alligator",
    "Alpaca",
    "Armadillo",
    "Badger",
    "Barracuda",
    "Bison",
    "Butterfly",
    "Camel",
    "Caribou",
    "Cheetah",
    "Chinchilla",
    "Cobra",
    "Coyote",
    "Crane",
    "Dolphin",
    "Dragonfly",
    "Eagle",
    "Elephant",
    "Falcon",
    "Ferret",
    "Flamingo",
    "Gazelle",
    "Giraffe",
    "Gorilla",
    "Hedgehog",
    "Heron",
    "Hippopotamus",
    "Hyena",
    "Iguana",
    "Jackal",
    "Jaguar",
    "Kangaroo",
    "Koala",
    "Lemur",
    "Leopard",
    "Lynx",
    "Manatee",
    "Meerkat",
    "Moose",
    "Narwhal",
    "Octopus",
    "Ocelot",
    "Orangutan",
    "Otter",
    "Panther",
    "Pelican",
    "Penguin",
    "Porcupine",
    "Raccoon",
    "Raven",
    "Salamander",
    "Seahorse",
    "Sloth",
    "Tapir",
    "Tiger",
    "Toucan",
    "Walrus",
    "Wolverine",
    "Yak",
    "Zebra",
];

/// Source of random scalar values.
#[derive(Debug, Clone)]
pub struct FieldGenerator<R> {
    rng: R,
}

impl<R: Rng> FieldGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform integer in `[min, max]`.
    ///
    /// A range with `max < min` collapses to `min`, which lets callers pass
    /// bounds such as `count - 1` for an empty collection.
    pub fn integer(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform non-negative count in `[0, max]`.
    pub fn count_up_to(&mut self, max: i64) -> u64 {
        self.integer(0, max).max(0) as u64
    }

    /// Uniform index into a collection of `len` elements.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..len))
    }

    /// Uniformly sampled element (with replacement).
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// `true` with `likelihood` percent probability (clamped to 100).
    pub fn boolean(&mut self, likelihood: u8) -> bool {
        self.rng.gen_ratio(u32::from(likelihood.min(100)), 100)
    }

    /// Uniform instant between the Unix epoch and `max`.
    pub fn date_until(&mut self, max: DateTime<Utc>) -> DateTime<Utc> {
        let upper = max.timestamp_millis();
        if upper <= 0 {
            return max;
        }
        let millis = self.rng.gen_range(0..=upper);
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(max)
    }

    /// Lorem sentence. `words = None` picks 12..=18 words; `punctuation`
    /// appends a trailing period.
    pub fn sentence(&mut self, words: Option<usize>, punctuation: bool) -> String {
        let count = words.unwrap_or_else(|| self.rng.gen_range(12..=18));
        let words: Vec<String> = Words(count..count + 1).fake_with_rng(&mut self.rng);

        let mut sentence = capitalize(&words.join(" "));
        if punctuation && !sentence.is_empty() {
            sentence.push('.');
        }
        sentence
    }

    pub fn name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    pub fn email(&mut self) -> String {
        FreeEmail().fake_with_rng(&mut self.rng)
    }

    pub fn city(&mut self) -> String {
        CityName().fake_with_rng(&mut self.rng)
    }

    pub fn animal(&mut self) -> &'static str {
        ANIMALS.choose(&mut self.rng).copied().unwrap_or("Aardvark")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fields() -> FieldGenerator<StdRng> {
        FieldGenerator::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_integer_is_inclusive_and_bounded() {
        let mut fields = fields();
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2_000 {
            let v = fields.integer(1, 10);
            assert!((1..=10).contains(&v));
            seen_min |= v == 1;
            seen_max |= v == 10;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_integer_empty_range_collapses_to_min() {
        let mut fields = fields();
        assert_eq!(fields.integer(0, -1), 0);
        assert_eq!(fields.integer(5, 5), 5);
        assert_eq!(fields.count_up_to(-1), 0);
    }

    #[test]
    fn test_boolean_extremes() {
        let mut fields = fields();
        for _ in 0..200 {
            assert!(!fields.boolean(0));
            assert!(fields.boolean(100));
            assert!(fields.boolean(250));
        }
    }

    #[test]
    fn test_date_never_after_max() {
        let mut fields = fields();
        let now = Utc::now();
        for _ in 0..500 {
            assert!(fields.date_until(now) <= now);
        }
    }

    #[test]
    fn test_sentence_word_count() {
        let mut fields = fields();
        let s = fields.sentence(Some(10), false);
        assert_eq!(s.split_whitespace().count(), 10);
        assert!(!s.ends_with('.'));

        let s = fields.sentence(None, true);
        let n = s.split_whitespace().count();
        assert!((12..=18).contains(&n), "unexpected word count {n}");
        assert!(s.ends_with('.'));
        assert!(s.chars().next().is_some_and(|c| !c.is_lowercase()));
    }

    #[test]
    fn test_pick_and_index_on_empty() {
        let mut fields = fields();
        let empty: [u8; 0] = [];
        assert!(fields.pick(&empty).is_none());
        assert!(fields.index(0).is_none());
        assert_eq!(fields.index(1), Some(0));
    }

    #[test]
    fn test_text_fields_are_non_empty() {
        let mut fields = fields();
        assert!(!fields.name().is_empty());
        assert!(fields.email().contains('@'));
        assert!(!fields.city().is_empty());
        assert!(!fields.animal().is_empty());
    }
}
