use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Milliseconds since the Unix epoch (or since an arbitrary origin for test clocks).
pub type TimestampMs = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExerciseKind {
    Choice,
    ShortText,
    LongText,
    SelfProgress,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Choice,
        ExerciseKind::ShortText,
        ExerciseKind::LongText,
        ExerciseKind::SelfProgress,
    ];

    /// Prefix used when synthesizing identifiers (`choice_1`, `short_2`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::Choice => "choice",
            ExerciseKind::ShortText => "short",
            ExerciseKind::LongText => "long",
            ExerciseKind::SelfProgress => "self_progress",
        }
    }

    /// Container class describing the kind for stylesheets.
    pub fn container_class(self) -> &'static str {
        match self {
            ExerciseKind::Choice => "exercise-choice",
            ExerciseKind::ShortText => "exercise-short",
            ExerciseKind::LongText => "exercise-long",
            ExerciseKind::SelfProgress => "exercise-self-progress",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, ExerciseKind::ShortText | ExerciseKind::LongText)
    }

    /// Quiz-like kinds are numbered "Question N", the rest "Exercise N".
    pub fn is_question(self) -> bool {
        !matches!(self, ExerciseKind::SelfProgress)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    #[default]
    Unanswered,
    Draft,
    Submitted,
    Editing,
}

impl LifecycleState {
    /// Inputs accept interaction in every state but `Submitted`.
    pub fn is_enabled(self) -> bool {
        !matches!(self, LifecycleState::Submitted)
    }
}

/// Logical path of the displayed page, used to scope persisted keys.
///
/// Query strings, fragments, a trailing `index.html` and trailing slashes are not part of
/// the logical path, so `/guide/`, `/guide/index.html#q2` and `/guide` are one page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath(String);

impl PagePath {
    pub fn from_location(location: &str) -> PagePath {
        let parsed = Url::parse(location).or_else(|_| {
            Url::parse("http://localhost/").and_then(|base| base.join(location.trim()))
        });
        let raw = match &parsed {
            Ok(url) => url.path(),
            Err(_) => location.split(['?', '#']).next().unwrap_or(""),
        };
        PagePath(normalize_path(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize_path(raw: &str) -> String {
    let mut path = raw.trim();
    if let Some(stripped) = path.strip_suffix("index.html") {
        path = stripped;
    }
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return "/".to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves a link target against the location it was activated on, so in-page anchors and
/// relative links land on the right page. Unresolvable input is returned as given.
pub fn resolve_location(base: &str, href: &str) -> String {
    let base = Url::parse(base)
        .or_else(|_| Url::parse("http://localhost/").and_then(|root| root.join(base.trim())));
    match base.and_then(|base| base.join(href.trim())) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Time source for timestamps and timer deadlines.
pub trait Clock {
    fn now_ms(&self) -> TimestampMs;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as TimestampMs)
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_path_ignores_fragment_query_and_index() {
        let a = PagePath::from_location("https://docs.example.com/guide/loops/");
        let b = PagePath::from_location("https://docs.example.com/guide/loops/index.html#q2");
        let c = PagePath::from_location("https://docs.example.com/guide/loops?x=1");
        assert_eq!(a.as_str(), "/guide/loops");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn page_path_accepts_relative_locations() {
        assert_eq!(PagePath::from_location("guide/loops/").as_str(), "/guide/loops");
        assert_eq!(PagePath::from_location("/").as_str(), "/");
        assert_eq!(PagePath::from_location("").as_str(), "/");
        assert_eq!(PagePath::from_location("file:///tmp/site/index.html").as_str(), "/tmp/site");
    }

    #[test]
    fn links_resolve_against_the_current_location() {
        let base = "https://docs.example.com/guide/loops/";
        let page = |href: &str| PagePath::from_location(&resolve_location(base, href));
        assert_eq!(page("#q2").as_str(), "/guide/loops");
        assert_eq!(page("../functions/").as_str(), "/guide/functions");
        assert_eq!(page("https://other.org/x/").as_str(), "/x");
        assert_eq!(
            PagePath::from_location(&resolve_location("/guide/loops/", "#q2")).as_str(),
            "/guide/loops"
        );
    }

    #[test]
    fn distinct_pages_have_distinct_paths() {
        assert_ne!(
            PagePath::from_location("https://x.org/a/"),
            PagePath::from_location("https://x.org/b/")
        );
    }

    #[test]
    fn kind_names_and_question_labels() {
        assert_eq!(ExerciseKind::SelfProgress.as_str(), "self_progress");
        assert!(ExerciseKind::LongText.is_question());
        assert!(!ExerciseKind::SelfProgress.is_question());
        assert!(ExerciseKind::ShortText.is_text());
        assert!(!ExerciseKind::Choice.is_text());
    }

    #[test]
    fn only_submitted_is_disabled() {
        assert!(LifecycleState::Unanswered.is_enabled());
        assert!(LifecycleState::Draft.is_enabled());
        assert!(LifecycleState::Editing.is_enabled());
        assert!(!LifecycleState::Submitted.is_enabled());
    }
}
