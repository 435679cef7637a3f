//! The filter/search model the browser widget runs against the pre-built
//! index: tokenize a query, keep posts whose search text contains every
//! token, restrict by selected tag, and paginate the result. All widget
//! state round-trips through a URL query string so results are shareable
//! and back/forward-navigable.

use crate::index::{Index, PostMetadata};
use url::form_urlencoded;

/// Posts per result page.
pub const PAGE_SIZE: usize = 10;

/// The tag value meaning "no tag filter".
const ALL_TAGS: &str = "all";

/// One fully-decoded widget state: free-text query, selected tag, and the
/// 1-based result page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub tag: Option<String>,
    pub page: usize,
}

impl Default for Query {
    fn default() -> Query {
        Query {
            text: String::new(),
            tag: None,
            page: 1,
        }
    }
}

impl Query {
    /// Decodes a query from URL query-string parameters (`q`, `tag`,
    /// `page`). Unknown parameters are ignored; a missing or unparseable
    /// `page` means page 1; `tag=all` means no tag filter.
    pub fn from_query_string(qs: &str) -> Query {
        let mut query = Query::default();
        for (key, value) in form_urlencoded::parse(qs.as_bytes()) {
            match &*key {
                "q" => query.text = value.into_owned(),
                "tag" => {
                    if value != ALL_TAGS && !value.is_empty() {
                        query.tag = Some(value.into_owned());
                    }
                }
                "page" => {
                    if let Ok(page) = value.parse::<usize>() {
                        query.page = std::cmp::max(1, page);
                    }
                }
                _ => {}
            }
        }
        query
    }

    /// Encodes the query back into query-string parameters, omitting
    /// defaults so clean states produce clean URLs. The inverse of
    /// [`Query::from_query_string`].
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(tag) = &self.tag {
            serializer.append_pair("tag", tag);
        }
        let text = normalize(&self.text);
        if !text.is_empty() {
            serializer.append_pair("q", &text);
        }
        if self.page > 1 {
            serializer.append_pair("page", &self.page.to_string());
        }
        serializer.finish()
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultPage<'a> {
    pub items: Vec<&'a PostMetadata>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Normalizes a free-text query: lowercased, trimmed, inner whitespace runs
/// collapsed to single spaces.
pub fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Runs a [`Query`] against the index. Matching posts contain every query
/// token in their search text (an empty query matches everything) and carry
/// the selected tag, if any. The requested page is clamped into the valid
/// range, so an out-of-range share link degrades to the nearest real page
/// instead of an empty one.
pub fn search<'a>(index: &'a Index, query: &Query) -> ResultPage<'a> {
    let normalized = normalize(&query.text);
    let tokens: Vec<&str> = normalized.split_whitespace().collect();

    let matches: Vec<&PostMetadata> = index
        .posts
        .iter()
        .filter(|post| match &query.tag {
            None => true,
            Some(tag) => post.tags.iter().any(|t| &t.slug == tag),
        })
        .filter(|post| tokens.iter().all(|token| post.search_text.contains(token)))
        .collect();

    let total = matches.len();
    let total_pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
    let current_page = std::cmp::max(1, std::cmp::min(query.page, std::cmp::max(1, total_pages)));
    let start = (current_page - 1) * PAGE_SIZE;
    let items = matches
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .collect::<Vec<&PostMetadata>>();

    ResultPage {
        items,
        total,
        total_pages,
        has_prev: current_page > 1,
        has_next: current_page < total_pages,
        current_page,
    }
}
