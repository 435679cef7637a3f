//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] tag.

use gtmpl::Value;
use std::hash::{Hash, Hasher};
use url::Url;

/// Represents a [`crate::post::Post`] tag. Tags keep the display string the
/// author wrote (`Operating Systems`) alongside the slug it normalizes to
/// (`operating-systems`); the slug is the identity, so differently-cased
/// spellings of the same tag collapse into one listing.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as written in the post frontmatter, trimmed.
    pub display: String,

    /// The normalized form of `display`: lowercased, whitespace and
    /// underscores become hyphens, punctuation is dropped, hyphen runs are
    /// collapsed. Safe to drop into a [`Url`] or a file name.
    pub slug: String,

    /// The URL for the tag's first listing page. Given a `tags_base_url`,
    /// this looks like `{tags_base_url}{slug}/index.html`.
    pub url: Url,
}

impl Tag {
    /// Builds a [`Tag`] from a frontmatter display string and the base URL
    /// under which tag listing pages live.
    pub fn new(display: &str, tags_base_url: &Url) -> Result<Tag, url::ParseError> {
        let display = display.trim();
        let slug = slug::slugify(display);
        Ok(Tag {
            url: tags_base_url.join(&format!("{}/index.html", slug))?,
            display: display.to_owned(),
            slug,
        })
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("display".to_owned(), (&t.display).into());
        m.insert("slug".to_owned(), (&t.slug).into());
        m.insert("url".to_owned(), Value::String(t.url.to_string()));
        Value::Object(m)
    }
}
