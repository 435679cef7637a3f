//! The canonical post-metadata index. This is the one artifact every other
//! output is derived from: listing pages and tag pages enumerate it, the
//! feed and sitemap walk it, and the browser downloads it verbatim as
//! `posts-index.json` to drive client-side filter/search.
//!
//! The index is deterministic: posts are ordered by date descending with the
//! title as tiebreak, tags are aggregated into a sorted table, and the JSON
//! serialization has fixed field and key order, so building twice over an
//! unchanged content store produces byte-identical output.

use crate::post::Post;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Words per minute assumed for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// A tag reference as it appears on a single post: the display string plus
/// its slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub display: String,
    pub slug: String,
}

/// The indexed metadata for one post. This is the record the browser's
/// filter/search widget operates on; the post body itself is not part of
/// the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRef>,
    pub reading_time: String,
    pub search_text: String,
}

/// The aggregate for one tag: its display string, how many posts carry it,
/// and those posts' slugs in index order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub display: String,
    pub count: usize,
    pub posts: Vec<String>,
}

/// One row of the tag summary list: tags ordered by count descending,
/// display ascending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub slug: String,
    pub display: String,
    pub count: usize,
}

/// The whole index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub posts: Vec<PostMetadata>,
    pub tag_index: BTreeMap<String, TagInfo>,
    pub tags: Vec<TagSummary>,
}

impl Index {
    /// Builds the index from parsed posts. Ordering is (re)established here
    /// rather than trusted from the caller; the index owns the determinism
    /// invariant.
    pub fn from_posts(posts: &[Post]) -> Index {
        let mut metadata: Vec<PostMetadata> = posts
            .iter()
            .map(|post| PostMetadata {
                slug: post.slug.clone(),
                title: post.title.clone(),
                date: post.date_string(),
                description: post.description.clone(),
                image: post.image.clone(),
                tags: post
                    .tags
                    .iter()
                    .map(|t| TagRef {
                        display: t.display.clone(),
                        slug: t.slug.clone(),
                    })
                    .collect(),
                reading_time: post.reading_time.clone(),
                search_text: post.search_text.clone(),
            })
            .collect();

        // Dates render as YYYY-MM-DD, so the lexicographic order is the
        // chronological order.
        metadata.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));

        let mut tag_index: BTreeMap<String, TagInfo> = BTreeMap::new();
        for post in &metadata {
            for tag in &post.tags {
                let entry = tag_index.entry(tag.slug.clone()).or_insert_with(|| TagInfo {
                    display: tag.display.clone(),
                    count: 0,
                    posts: Vec::new(),
                });
                entry.count += 1;
                entry.posts.push(post.slug.clone());
            }
        }

        let mut tags: Vec<TagSummary> = tag_index
            .iter()
            .map(|(slug, info)| TagSummary {
                slug: slug.clone(),
                display: info.display.clone(),
                count: info.count,
            })
            .collect();
        tags.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.display.cmp(&b.display))
        });

        Index {
            posts: metadata,
            tag_index,
            tags,
        }
    }

    /// Looks up a post by slug.
    pub fn post(&self, slug: &str) -> Option<&PostMetadata> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Looks up a tag aggregate by slug.
    pub fn tag(&self, slug: &str) -> Option<&TagInfo> {
        self.tag_index.get(slug)
    }

    /// Returns the posts carrying a tag, in index order.
    pub fn posts_with_tag(&self, slug: &str) -> Vec<&PostMetadata> {
        match self.tag_index.get(slug) {
            None => Vec::new(),
            Some(info) => info
                .posts
                .iter()
                .filter_map(|slug| self.post(slug))
                .collect(),
        }
    }

    /// Serializes the index as pretty-printed JSON. Key order is fixed by
    /// the struct field order and the [`BTreeMap`], so the output is stable
    /// across runs.
    pub fn write_json<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut w, self).map_err(std::io::Error::from)?;
        w.write_all(b"\n")
    }
}

/// Formats a reading-time estimate from a post body's plain text, assuming
/// 200 words per minute and never reporting less than a minute.
pub fn reading_time(plain_text: &str) -> String {
    let words = plain_text.split_whitespace().count();
    let minutes = std::cmp::max(1, (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE);
    format!("{} min read", minutes)
}

/// Assembles the flattened search blob for one post: title, description, tag
/// display names, and the body plain text, lowercased with whitespace
/// collapsed. Client-side search substring-matches query tokens against
/// this.
pub fn search_text(
    title: &str,
    description: &str,
    tag_displays: &[&str],
    plain_text: &str,
) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3 + tag_displays.len());
    parts.push(title);
    parts.push(description);
    parts.extend(tag_displays);
    parts.push(plain_text);
    parts
        .join(" ")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::sample;
    use crate::tag::Tag;
    use url::Url;

    fn tagged(slug: &str, title: &str, date: &str, tags: &[&str]) -> Post {
        let tags_url = Url::parse("https://example.org/pages/").unwrap();
        let mut post = sample(slug, title, date);
        post.tags = tags
            .iter()
            .map(|t| Tag::new(t, &tags_url).unwrap())
            .collect();
        post
    }

    #[test]
    fn test_orders_by_date_desc_then_title() {
        let posts = vec![
            sample("b", "Beta", "2024-01-01"),
            sample("c", "Gamma", "2024-03-01"),
            sample("a", "Alpha", "2024-01-01"),
        ];
        let index = Index::from_posts(&posts);
        let slugs: Vec<&str> = index.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_aggregates_tags_in_index_order() {
        let posts = vec![
            tagged("new", "New", "2024-02-01", &["Rust", "Networking"]),
            tagged("old", "Old", "2024-01-01", &["Rust"]),
        ];
        let index = Index::from_posts(&posts);

        let rust = index.tag("rust").expect("rust tag indexed");
        assert_eq!(rust.display, "Rust");
        assert_eq!(rust.count, 2);
        assert_eq!(rust.posts, vec!["new".to_owned(), "old".to_owned()]);

        assert_eq!(index.posts_with_tag("networking").len(), 1);
        assert!(index.tag("never-used").is_none());
    }

    #[test]
    fn test_tag_summaries_sort_by_count_then_display() {
        let posts = vec![
            tagged("p1", "P1", "2024-03-01", &["Zig", "Ada"]),
            tagged("p2", "P2", "2024-02-01", &["Ada"]),
        ];
        let index = Index::from_posts(&posts);
        let order: Vec<&str> = index.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(order, vec!["ada", "zig"]);
        assert_eq!(index.tags[0].count, 2);
    }

    #[test]
    fn test_json_is_stable_and_omits_empty_fields() {
        let posts = vec![sample("only", "Only", "2024-01-01")];
        let index = Index::from_posts(&posts);

        let mut first = Vec::new();
        index.write_json(&mut first).unwrap();
        let mut second = Vec::new();
        Index::from_posts(&posts).write_json(&mut second).unwrap();
        assert_eq!(first, second);

        let json = String::from_utf8(first).unwrap();
        assert!(json.contains("\"readingTime\""));
        assert!(json.contains("\"searchText\""));
        // an untagged, imageless post record serializes without those keys;
        // the single "tags" occurrence is the index's own summary list
        assert_eq!(json.matches("\"tags\"").count(), 1);
        assert!(!json.contains("\"image\""));
    }

    #[test]
    fn test_reading_time_rounds_up_with_floor_of_one() {
        assert_eq!(reading_time(""), "1 min read");
        assert_eq!(reading_time("one two three"), "1 min read");
        let two_hundred_one = vec!["word"; 201].join(" ");
        assert_eq!(reading_time(&two_hundred_one), "2 min read");
    }

    #[test]
    fn test_search_text_is_lowercase_and_collapsed() {
        assert_eq!(
            search_text(
                "Hello, World!",
                "A   greeting",
                &["Rust", "Hello"],
                "Body  text"
            ),
            "hello, world! a greeting rust hello body text"
        );
    }
}
