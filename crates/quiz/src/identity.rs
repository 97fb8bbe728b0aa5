use crate::classify::Classification;
use crate::markup::ID_CLASS_PREFIX;
use core_types::{ExerciseKind, PagePath};
use html::Node;
use std::collections::{HashMap, HashSet};

/// Assigns per-document exercise identities for one pass.
///
/// Counters and the set of names taken restart with every pass. Identities are written back
/// onto the containers, so the next pass over the same document reads the same names back.
/// Identities of blocks bound in earlier passes are [reserved](Self::reserve) up front: a
/// block mounted later never takes a bound block's name, whatever its position.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    counters: HashMap<ExerciseKind, usize>,
    fallback: usize,
    taken: HashSet<String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the block at 1-based `position` among exercise blocks.
    ///
    /// `existing` is the identifier the container already carries, if any.
    pub fn resolve(
        &mut self,
        existing: Option<&str>,
        classification: Classification,
        position: usize,
    ) -> String {
        let counter = self.advance(classification);

        let candidate = match (existing.map(str::trim).filter(|s| !s.is_empty()), counter) {
            (Some(name), _) => name.to_string(),
            (None, Some((kind, n))) => format!("{}_{n}", kind.as_str()),
            (None, None) => {
                self.fallback += 1;
                format!("exercise_{}", self.fallback)
            }
        };

        let identity = self.disambiguate(candidate, position);
        self.taken.insert(identity.clone());
        identity
    }

    /// Marks `identity` as taken by a block bound in an earlier pass.
    pub fn reserve(&mut self, identity: &str) {
        self.taken.insert(identity.to_string());
    }

    /// Identity of an already bound block: its reserved name, unchanged. Kind counters still
    /// advance so synthesized names of later blocks match a fresh pass.
    pub fn keep(&mut self, identity: &str, classification: Classification) -> String {
        self.advance(classification);
        self.taken.insert(identity.to_string());
        identity.to_string()
    }

    fn advance(&mut self, classification: Classification) -> Option<(ExerciseKind, usize)> {
        classification.kind().map(|kind| {
            let counter = self.counters.entry(kind).or_insert(0);
            *counter += 1;
            (kind, *counter)
        })
    }

    fn disambiguate(&self, candidate: String, position: usize) -> String {
        if !self.taken.contains(&candidate) {
            return candidate;
        }
        let base = format!("{candidate}-{position}");
        if !self.taken.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|name| !self.taken.contains(name))
            .unwrap_or(base)
    }
}

/// Persistence key of an exercise: the page path, the separator, then the identity.
pub fn storage_key(page: &PagePath, separator: &str, identity: &str) -> String {
    format!("{}{separator}{identity}", page.as_str())
}

/// Prefix shared by every key of `page`.
pub fn page_prefix(page: &PagePath, separator: &str) -> String {
    format!("{}{separator}", page.as_str())
}

/// Consumes an `id_<name>` class set by the content pipeline and moves it to the `id`
/// attribute. Returns the container's identifier afterwards.
pub fn adopt_pipeline_id(container: &mut Node) -> Option<String> {
    let pipeline = container
        .classes()
        .find_map(|c| c.strip_prefix(ID_CLASS_PREFIX))
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    if let Some(name) = pipeline {
        container.remove_class(&format!("{ID_CLASS_PREFIX}{name}"));
        container.set_attr("id", Some(&name));
    }
    container
        .attr("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
