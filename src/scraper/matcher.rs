use std::collections::{HashMap, HashSet};

/// A search hit that can be ranked and de-duplicated
pub trait Ranked {
    /// Relevance score, higher is better
    fn relevance(&self) -> f64;

    /// Identity used for duplicate suppression: (first URL, display title)
    fn dedup_key(&self) -> (String, String);
}

/// Scoring and ranking of search candidates
pub struct Matcher;

impl Matcher {
    /// Relevance of a candidate title against the query.
    ///
    /// Fuzzy title similarity in [0, 1] plus a year bonus of 1 for the same
    /// year, 0.5 for one year off and 0 beyond that.
    #[must_use]
    pub fn score(
        query: &str,
        candidate: &str,
        query_year: Option<i32>,
        candidate_year: Option<i32>,
    ) -> f64 {
        Self::similarity(&query.to_lowercase(), &candidate.to_lowercase())
            + Self::year_score(query_year, candidate_year)
    }

    /// Year proximity bonus; 0 when either year is unknown
    #[must_use]
    pub fn year_score(query_year: Option<i32>, candidate_year: Option<i32>) -> f64 {
        match (query_year, candidate_year) {
            (Some(a), Some(b)) => (1.0 - 0.5 * f64::from(a.abs_diff(b))).max(0.0),
            _ => 0.0,
        }
    }

    /// Sørensen–Dice similarity over character bigrams
    #[must_use]
    pub fn similarity(a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let bigrams_a = Self::bigrams(a);
        let bigrams_b = Self::bigrams(b);
        let total: usize = bigrams_a.values().sum::<usize>() + bigrams_b.values().sum::<usize>();
        if total == 0 {
            return 0.0;
        }

        let shared: usize = bigrams_a
            .iter()
            .map(|(pair, count)| bigrams_b.get(pair).map_or(0, |other| (*count).min(*other)))
            .sum();

        (2 * shared) as f64 / total as f64
    }

    fn bigrams(s: &str) -> HashMap<(char, char), usize> {
        let chars: Vec<char> = s.chars().collect();
        let mut counts = HashMap::new();
        for pair in chars.windows(2) {
            *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
        }
        counts
    }

    /// Sort by relevance, highest first. Equal scores keep their input order.
    pub fn stable_sort<T: Ranked>(items: &mut [T]) {
        items.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
    }

    /// Drop later candidates sharing a (first URL, title) key
    #[must_use]
    pub fn dedup<T: Ranked>(items: Vec<T>) -> Vec<T> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| seen.insert(item.dedup_key()))
            .collect()
    }

    /// Dedup followed by a stable sort
    #[must_use]
    pub fn rank<T: Ranked>(items: Vec<T>) -> Vec<T> {
        let mut ranked = Self::dedup(items);
        Self::stable_sort(&mut ranked);
        ranked
    }
}
