//! Markup stripping and whitespace normalization.

use scraper::{Html, Node};

const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_markup(s: &str) -> bool {
    s.contains('<') || s.contains('&')
}

/// Text nodes of `s` parsed as an HTML fragment, joined with spaces.
fn strip_markup(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    let mut out = String::with_capacity(s.len());
    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| INVISIBLE.contains(&e.name())))
            .unwrap_or(false);
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

fn pass(s: &str) -> String {
    if looks_like_markup(s) {
        collapse_whitespace(&strip_markup(s))
    } else {
        collapse_whitespace(s)
    }
}

/// Strip all markup and collapse whitespace runs to single spaces.
///
/// Idempotent: the pass is repeated until the text stops changing, because
/// decoding an entity such as `&lt;b&gt;` can itself produce markup. A pass
/// that changes the text always shortens it, so the loop terminates.
pub fn normalize(input: &str) -> String {
    let mut current = pass(input);
    loop {
        let next = pass(&current);
        if next.len() >= current.len() {
            return current;
        }
        current = next;
    }
}
