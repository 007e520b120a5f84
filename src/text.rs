//! Title cleanup for video titles returned by the YouTube API

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a hashtag and everything up to the next whitespace
static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\S+").expect("valid hashtag regex"));

/// Matches any run of whitespace
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Removes hashtags from a title and collapses the remaining whitespace
///
/// # Examples
/// ```
/// use triples::text::clean_title;
///
/// assert_eq!(clean_title("My Big Update #space #news"), "My Big Update");
/// ```
pub fn clean_title(title: &str) -> String {
    let without_tags = HASHTAG.replace_all(title, "");
    WHITESPACE
        .replace_all(without_tags.trim(), " ")
        .into_owned()
}
