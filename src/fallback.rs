//! Ordered "try A, else B, else C" lookup over named optional fields.
//!
//! Used for the feed-embedded content fallback and the published-date field
//! lookup on [`crate::models::FeedEntry`].

/// Whether a value counts as present for fallback purposes.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }
}

/// Return the first candidate whose value is present, together with its name.
///
/// Candidates are evaluated strictly in the order given. Blank strings are
/// treated as absent.
///
/// # Examples
///
/// ```
/// use feed_digest::fallback::first_present;
///
/// let content: Option<&str> = None;
/// let summary = Some("short summary");
/// let picked = first_present([("content", content), ("summary", summary)]);
/// assert_eq!(picked, Some(("summary", "short summary")));
/// ```
pub fn first_present<'a, T, I>(candidates: I) -> Option<(&'static str, &'a T)>
where
    T: Presence + ?Sized,
    I: IntoIterator<Item = (&'static str, Option<&'a T>)>,
{
    candidates
        .into_iter()
        .find_map(|(name, value)| value.filter(|v| v.is_present()).map(|v| (name, v)))
}
