use std::time::{Duration, Instant};

pub const TOKEN_OPEN: &str = "{{response.";

/// How long a blurred field keeps its candidate list, so a click on a
/// candidate lands before the list disappears.
pub const BLUR_GRACE: Duration = Duration::from_millis(200);

fn byte_offset(text: &str, caret: usize) -> usize {
    text.char_indices()
        .nth(caret)
        .map_or(text.len(), |(i, _)| i)
}

/// The partially typed path after an unterminated `{{response.` that ends
/// at `caret` (a char index), if any.
pub fn active_filter(text: &str, caret: usize) -> Option<&str> {
    let before = &text[..byte_offset(text, caret)];
    let start = before.rfind(TOKEN_OPEN)?;
    let tail = &before[start + TOKEN_OPEN.len()..];
    if tail.contains('}') {
        None
    } else {
        Some(tail)
    }
}

pub fn filter_suggestions(paths: &[String], filter: &str) -> Vec<String> {
    if filter.is_empty() {
        return paths.to_vec();
    }
    let needle = filter.to_lowercase();
    paths
        .iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            lower.contains(&needle) || lower.replacen("response.", "", 1).starts_with(&needle)
        })
        .cloned()
        .collect()
}

/// Replaces the open token before `caret` with `{{candidate}}`, keeping
/// whatever followed the caret. Returns the new text and caret.
pub fn insert_suggestion(text: &str, caret: usize, candidate: &str) -> Option<(String, usize)> {
    active_filter(text, caret)?;
    let end = byte_offset(text, caret);
    let start = text[..end].rfind(TOKEN_OPEN)?;
    let head = format!("{}{{{{{}}}}}", &text[..start], candidate);
    let caret = head.chars().count();
    Some((format!("{}{}", head, &text[end..]), caret))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionList {
    pub open: bool,
    pub filter: String,
    pub active: usize,
    pub dismiss_at: Option<Instant>,
}

impl SuggestionList {
    pub fn show(&mut self, filter: &str) {
        self.open = true;
        self.filter = filter.to_string();
        self.active = 0;
        self.dismiss_at = None;
    }

    pub fn dismiss(&mut self) {
        self.open = false;
        self.dismiss_at = None;
    }

    pub fn move_down(&mut self, len: usize) {
        self.active = (self.active + 1).min(len.saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    pub fn schedule_dismiss(&mut self, at: Instant) {
        if self.open {
            self.dismiss_at = Some(at + BLUR_GRACE);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.dismiss_at.is_some_and(|deadline| deadline <= now) {
            self.dismiss();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn detects_open_token_before_caret() {
        assert_eq!(active_filter("{{response.", 11), Some(""));
        assert_eq!(active_filter("x {{response.da", 15), Some("da"));
        assert_eq!(active_filter("{{response.data}}", 17), None);
        assert_eq!(active_filter("{{response.data}} and {{response.it", 35), Some("it"));
        assert_eq!(active_filter("plain text", 10), None);
    }

    #[test]
    fn caret_limits_the_scan() {
        let text = "{{response.name}} tail";
        assert_eq!(active_filter(text, 13), Some("na"));
        assert_eq!(active_filter(text, 5), None);
        assert_eq!(active_filter("{{response.ab", 999), Some("ab"));
    }

    #[test]
    fn caret_counts_characters() {
        let text = "ümlaut {{response.x";
        assert_eq!(active_filter(text, text.chars().count()), Some("x"));
    }

    #[test]
    fn filter_keeps_discovery_order() {
        let paths = owned(&["response.data.name", "response.items.name", "response.count"]);
        assert_eq!(filter_suggestions(&paths, ""), paths);
        assert_eq!(
            filter_suggestions(&paths, "NAME"),
            owned(&["response.data.name", "response.items.name"])
        );
        assert_eq!(filter_suggestions(&paths, "items"), owned(&["response.items.name"]));
        assert!(filter_suggestions(&paths, "zzz").is_empty());
    }

    #[test]
    fn refiltering_is_idempotent() {
        let paths = owned(&["response.a.price", "response.b.cost", "response.price"]);
        let once = filter_suggestions(&paths, "pri");
        assert_eq!(filter_suggestions(&once, "pri"), once);
    }

    #[test]
    fn insertion_preserves_trailing_text() {
        let (text, caret) = insert_suggestion("foo{{response.ab", 16, "response.abc").unwrap();
        assert_eq!(text, "foo{{response.abc}}");
        assert_eq!(caret, text.chars().count());

        let (text, caret) =
            insert_suggestion("foo{{response.ab rest", 16, "response.abc").unwrap();
        assert_eq!(text, "foo{{response.abc}} rest");
        assert_eq!(caret, 19);
    }

    #[test]
    fn insertion_needs_an_open_token() {
        assert!(insert_suggestion("foo", 3, "response.abc").is_none());
        assert!(insert_suggestion("{{response.a}}", 14, "response.abc").is_none());
    }

    #[test]
    fn cursor_is_clamped() {
        let mut list = SuggestionList::default();
        list.show("a");
        list.move_up();
        assert_eq!(list.active, 0);
        list.move_down(2);
        list.move_down(2);
        assert_eq!(list.active, 1);
        list.move_down(0);
        assert_eq!(list.active, 0);
    }

    #[test]
    fn blur_dismisses_after_grace() {
        let mut list = SuggestionList::default();
        list.show("");
        let t0 = Instant::now();
        list.schedule_dismiss(t0);
        list.tick(t0 + Duration::from_millis(50));
        assert!(list.open);
        list.tick(t0 + BLUR_GRACE);
        assert!(!list.open);
        assert!(list.dismiss_at.is_none());
    }
}
