//! Read-optimized lookup structures over a pattern collection.
//!
//! All five maps live behind one `RwLock` and are replaced together by
//! [`Index::build`]; readers never observe a partially built index.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::types::ThreatPattern;

/// Shared, immutable handle to an indexed pattern.
pub type PatternRef = Arc<ThreatPattern>;

#[derive(Debug, Default)]
struct Maps {
    patterns: Vec<PatternRef>,
    by_id: HashMap<String, PatternRef>,
    by_category: HashMap<String, Vec<PatternRef>>,
    by_language: HashMap<String, Vec<PatternRef>>,
    by_framework: HashMap<String, Vec<PatternRef>>,
    // Sorted so context matching visits keywords in a stable order.
    by_keyword: BTreeMap<String, Vec<PatternRef>>,
}

impl Maps {
    fn from_patterns(patterns: Vec<ThreatPattern>) -> Self {
        let mut maps = Maps {
            patterns: patterns.into_iter().map(Arc::new).collect(),
            ..Maps::default()
        };

        for p in &maps.patterns {
            if let Some(previous) = maps.by_id.insert(p.id.clone(), Arc::clone(p)) {
                tracing::warn!(id = %previous.id, "duplicate pattern id, later record wins");
            }

            maps.by_category
                .entry(p.category.to_lowercase())
                .or_default()
                .push(Arc::clone(p));
            maps.by_language
                .entry(p.language.to_lowercase())
                .or_default()
                .push(Arc::clone(p));
            maps.by_framework
                .entry(p.framework.to_lowercase())
                .or_default()
                .push(Arc::clone(p));

            let mut declared = HashSet::new();
            for keyword in p.keywords() {
                // A blank keyword is a substring of every context.
                if keyword.trim().is_empty() {
                    continue;
                }
                let lowered = keyword.to_lowercase();
                if declared.insert(lowered.clone()) {
                    maps.by_keyword
                        .entry(lowered)
                        .or_default()
                        .push(Arc::clone(p));
                }
            }
        }

        maps
    }
}

/// In-memory index over a pattern collection.
///
/// Safe to share across threads: lookups take a read lock, [`Index::build`]
/// takes the write lock only to swap in freshly built maps.
#[derive(Debug, Default)]
pub struct Index {
    maps: RwLock<Maps>,
}

impl Index {
    /// An empty index. Every lookup returns nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index built from `patterns`, as by [`Index::build`].
    pub fn from_patterns(patterns: Vec<ThreatPattern>) -> Self {
        let index = Self::new();
        index.build(patterns);
        index
    }

    /// Replace the whole index with one built from `patterns`.
    pub fn build(&self, patterns: Vec<ThreatPattern>) {
        let maps = Maps::from_patterns(patterns);
        tracing::info!(
            patterns = maps.patterns.len(),
            keywords = maps.by_keyword.len(),
            "pattern index built"
        );

        let mut guard = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        *guard = maps;
    }

    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        // The maps are only ever swapped whole, so a poisoned lock still
        // guards a consistent snapshot.
        self.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_by_id(&self, id: &str) -> Option<PatternRef> {
        self.read().by_id.get(id).cloned()
    }

    pub fn get_by_category(&self, category: &str) -> Vec<PatternRef> {
        lookup(&self.read().by_category, category)
    }

    pub fn get_by_language(&self, language: &str) -> Vec<PatternRef> {
        lookup(&self.read().by_language, language)
    }

    pub fn get_by_framework(&self, framework: &str) -> Vec<PatternRef> {
        lookup(&self.read().by_framework, framework)
    }

    pub fn get_by_keyword(&self, keyword: &str) -> Vec<PatternRef> {
        self.read()
            .by_keyword
            .get(&keyword.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Every indexed pattern, in collection order.
    pub fn get_all(&self) -> Vec<PatternRef> {
        self.read().patterns.clone()
    }

    pub fn len(&self) -> usize {
        self.read().patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().patterns.is_empty()
    }

    /// Patterns relevant to free text.
    ///
    /// Lower-cases `text` and returns, de-duplicated by id, every pattern with
    /// a keyword that occurs as a substring of it, followed by every remaining
    /// pattern with an action trigger phrase that occurs in it. Matching is
    /// plain substring search, so `job` also matches inside `jobs`.
    pub fn match_context(&self, text: &str) -> Vec<PatternRef> {
        let maps = self.read();
        let context = text.to_lowercase();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut matches = Vec::new();

        for (keyword, patterns) in &maps.by_keyword {
            if !context.contains(keyword.as_str()) {
                continue;
            }
            for p in patterns {
                if seen.insert(p.id.as_str()) {
                    matches.push(Arc::clone(p));
                }
            }
        }

        for p in &maps.patterns {
            if seen.contains(p.id.as_str()) {
                continue;
            }
            let triggered = p
                .actions()
                .iter()
                .filter(|a| !a.trim().is_empty())
                .any(|a| context.contains(&a.to_lowercase()));
            if triggered {
                seen.insert(p.id.as_str());
                matches.push(Arc::clone(p));
            }
        }

        matches
    }
}

fn lookup(map: &HashMap<String, Vec<PatternRef>>, key: &str) -> Vec<PatternRef> {
    map.get(&key.to_lowercase()).cloned().unwrap_or_default()
}
