//! The library code for the `stele` static blog compiler. The architecture
//! can be generally broken down into three distinct steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`])
//! 2. Reducing the posts to one canonical metadata index ([`crate::index`])
//! 3. Converting posts and index into output files on disk ([`crate::write`],
//!    [`crate::feed`], [`crate::sitemap`])
//!
//! The second step is the load-bearing one: every artifact the build emits
//! (listing pages, tag pages, the RSS feed, the sitemap, and the JSON index
//! the browser's filter/search widget downloads) is derived from that one
//! index, which is deterministically ordered and aggregated so that
//! rebuilding an unchanged content store is byte-for-byte idempotent.
//!
//! The third step is pretty straight-forward: for each page, apply the
//! template (either the post template or the listing template) and write
//! the result to disk; the feed and sitemap are serialized straight off the
//! post list. The query semantics of the browser widget (tokenized AND
//! matching, tag filtering, clamped pagination, shareable query-string
//! state) live in [`crate::search`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod index;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod search;
pub mod sitemap;
pub mod tag;
pub mod url;
pub mod util;
pub mod write;
