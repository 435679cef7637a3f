//! Defines the [`Post`] type: one fully-parsed post with its frontmatter
//! fields validated, its derived fields computed, and its body rendered to
//! HTML. See [`Post::to_value`] and [`Post::summarize`] for how posts are
//! converted into template values.

use crate::tag::Tag;
use chrono::NaiveDate;
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// One parsed post.
#[derive(Clone, Debug)]
pub struct Post {
    /// The post's identity: the bundle directory name or the source file
    /// stem. Doubles as the output page name (`{slug}.html`).
    pub slug: String,

    /// The post title, trimmed.
    pub title: String,

    /// The post date. Always rendered as `YYYY-MM-DD` regardless of how the
    /// frontmatter spelled it.
    pub date: NaiveDate,

    /// The post description, trimmed. Shown in listings and feeds.
    pub description: String,

    /// Optional cover image reference, passed through to templates.
    pub image: Option<String>,

    /// The post's tags in authored order, deduplicated by slug.
    pub tags: Vec<Tag>,

    /// Whether the frontmatter flagged the post as a draft.
    pub draft: bool,

    /// The estimated reading time, e.g. `4 min read`.
    pub reading_time: String,

    /// The flattened, lowercased text blob the client-side search matches
    /// against.
    pub search_text: String,

    /// The body rendered to HTML with references rewritten.
    pub body: String,

    /// The URL of the post's output page.
    pub url: Url,

    /// The location on disk where the output page will be written.
    pub file_path: PathBuf,
}

impl Post {
    /// The post's date as the site renders it.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    fn base_value(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), (&self.slug).into());
        m.insert("title".to_owned(), (&self.title).into());
        m.insert("date".to_owned(), Value::String(self.date_string()));
        m.insert("description".to_owned(), (&self.description).into());
        m.insert(
            "image".to_owned(),
            match &self.image {
                Some(image) => image.into(),
                None => Value::Nil,
            },
        );
        m.insert(
            "tags".to_owned(),
            Value::Array(self.tags.iter().map(Value::from).collect()),
        );
        m.insert("reading_time".to_owned(), (&self.reading_time).into());
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m
    }

    /// Converts a [`Post`] into the [`Value`] rendered by the post-page
    /// template, body included.
    pub fn to_value(&self) -> Value {
        let mut m = self.base_value();
        m.insert("body".to_owned(), (&self.body).into());
        Value::Object(m)
    }

    /// Converts a [`Post`] into the [`Value`] rendered inside listing pages:
    /// everything except the body.
    pub fn summarize(&self) -> Value {
        Value::Object(self.base_value())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    /// Builds a minimal post for tests across the crate.
    pub fn sample(slug: &str, title: &str, date: &str) -> Post {
        let posts_url = Url::parse("https://example.org/posts/").unwrap();
        Post {
            slug: slug.to_owned(),
            title: title.to_owned(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: format!("About {}", title),
            image: None,
            tags: Vec::new(),
            draft: false,
            reading_time: "1 min read".to_owned(),
            search_text: title.to_lowercase(),
            body: String::new(),
            url: posts_url.join(&format!("{}.html", slug)).unwrap(),
            file_path: PathBuf::from(format!("/tmp/posts/{}.html", slug)),
        }
    }

    #[test]
    fn test_summarize_omits_body() {
        let mut post = sample("hello-world", "Hello, world!", "2024-05-01");
        post.body = String::from("<p>secret</p>");
        match post.summarize() {
            Value::Object(m) => {
                assert!(!m.contains_key("body"));
                assert_eq!(m["date"], Value::String("2024-05-01".to_owned()));
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_to_value_includes_body() {
        let mut post = sample("hello-world", "Hello, world!", "2024-05-01");
        post.body = String::from("<p>hi</p>");
        match post.to_value() {
            Value::Object(m) => {
                assert_eq!(m["body"], Value::String("<p>hi</p>".to_owned()))
            }
            other => panic!("expected object, got {:?}", other),
        }
    }
}
