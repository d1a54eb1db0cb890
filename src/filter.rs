//! Keyword filtering.
//!
//! Matching is plain case-insensitive substring search over
//! `title + " " + summary`. Multi-word keywords must appear contiguously:
//! `"fast job"` does not match "fast-paced job".

use crate::error::ConfigError;
use crate::source::JobEntry;

/// Distinct lowercase keywords plus the number of them an entry must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
    min_match: usize,
}

impl KeywordSet {
    /// Normalise keywords (trim, lowercase, drop blanks and duplicates while
    /// keeping first-seen order) and check `1 <= min_match <= len`.
    pub fn new<S: AsRef<str>>(keywords: &[S], min_match: usize) -> Result<Self, ConfigError> {
        let mut normalised: Vec<String> = Vec::with_capacity(keywords.len());
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !normalised.contains(&k) {
                normalised.push(k);
            }
        }

        if normalised.is_empty() {
            return Err(ConfigError::Invalid("keywords must not be empty".into()));
        }
        if min_match == 0 || min_match > normalised.len() {
            return Err(ConfigError::Invalid(format!(
                "min_keyword_match must be between 1 and {} (got {min_match})",
                normalised.len()
            )));
        }

        Ok(Self {
            keywords: normalised,
            min_match,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn min_match(&self) -> usize {
        self.min_match
    }

    /// Keywords found in the entry, in keyword order.
    pub fn matches(&self, entry: &JobEntry) -> Vec<&str> {
        let text = entry.search_text();
        self.keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// An entry that passed the filter, with the keywords that got it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub entry: JobEntry,
    pub keywords: Vec<String>,
}

/// Keep entries containing at least `min_match` distinct keywords.
///
/// Pure and order-preserving.
pub fn filter(entries: Vec<JobEntry>, keywords: &KeywordSet) -> Vec<Match> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let found: Vec<String> = keywords
                .matches(&entry)
                .into_iter()
                .map(String::from)
                .collect();
            (found.len() >= keywords.min_match()).then_some(Match {
                entry,
                keywords: found,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, summary: &str) -> JobEntry {
        let link = format!("https://example.com/{}", title.replace(' ', "-"));
        JobEntry::new(title, Some(&link), summary, None).unwrap()
    }

    fn set(keywords: &[&str], min_match: usize) -> KeywordSet {
        KeywordSet::new(keywords, min_match).unwrap()
    }

    #[test]
    fn match_is_case_insensitive() {
        let k = set(&["python"], 1);
        let kept = filter(
            vec![
                entry("Remote PYTHON Developer", ""),
                entry("Remote Engineer", "Go and Kubernetes"),
            ],
            &k,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].entry.title, "Remote PYTHON Developer");
        assert_eq!(kept[0].keywords, ["python"]);
    }

    #[test]
    fn summary_is_searched_too() {
        let k = set(&["django"], 1);
        assert_eq!(filter(vec![entry("Backend role", "We use Django")], &k).len(), 1);
    }

    #[test]
    fn phrases_must_be_contiguous() {
        let k = set(&["fast job"], 1);
        assert!(filter(vec![entry("A fast-paced job", "")], &k).is_empty());
        assert_eq!(filter(vec![entry("Fast Job for students", "")], &k).len(), 1);
    }

    #[test]
    fn substring_not_token_matching() {
        // "freelance" is inside "freelancer".
        let k = set(&["freelance"], 1);
        assert_eq!(filter(vec![entry("Freelancer wanted", "")], &k).len(), 1);
    }

    #[test]
    fn min_match_counts_distinct_keywords() {
        let k = set(&["python", "django", "fastapi"], 2);
        let kept = filter(
            vec![
                entry("Python python PYTHON", ""),
                entry("Python dev", "Django REST"),
                entry("FastAPI + Django + Python", ""),
            ],
            &k,
        );
        let titles: Vec<&str> = kept.iter().map(|m| m.entry.title.as_str()).collect();
        assert_eq!(titles, ["Python dev", "FastAPI + Django + Python"]);
        assert_eq!(kept[1].keywords, ["python", "django", "fastapi"]);
    }

    #[test]
    fn filter_is_deterministic_and_order_preserving() {
        let k = set(&["python"], 1);
        let input = vec![
            entry("python b", ""),
            entry("rust", ""),
            entry("python a", ""),
        ];
        let first = filter(input.clone(), &k);
        let second = filter(input, &k);
        assert_eq!(first, second);
        let titles: Vec<&str> = first.iter().map(|m| m.entry.title.as_str()).collect();
        assert_eq!(titles, ["python b", "python a"]);
    }

    #[test]
    fn keywords_are_normalised() {
        let k = set(&[" Python ", "python", "", "Django"], 2);
        assert_eq!(k.keywords(), ["python", "django"]);
    }

    #[test]
    fn rejects_bad_thresholds() {
        assert!(KeywordSet::new(&["python"], 0).is_err());
        assert!(KeywordSet::new(&["python"], 2).is_err());
        assert!(KeywordSet::new::<&str>(&[], 1).is_err());
        assert!(KeywordSet::new(&["  "], 1).is_err());
    }
}
