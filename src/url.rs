//! Rewrites the link and image targets found inside post bodies into stable
//! absolute URLs. Relative references resolve against the referencing post's
//! own URL, intra-site markdown targets become their output page URLs, and
//! everything else passes through normalized.

use url::{ParseError, Url};

const MARKDOWN_EXTENSION: &str = ".md";
const HTML_EXTENSION: &str = ".html";

/// Rewrites reference targets for a single source file.
pub struct Rewriter<'a> {
    /// The URL under which all post pages and bundle assets live, e.g.,
    /// `https://example.org/posts/`. Must end in a trailing slash.
    posts_root: &'a Url,

    /// The URL of the source file currently being rewritten; relative
    /// references resolve against this.
    base: Url,
}

impl<'a> Rewriter<'a> {
    /// Constructs a new `Rewriter`. `source_path` is the path of the source
    /// file relative to the posts directory (e.g., `hello-world/index.md`).
    pub fn new(posts_root: &'a Url, source_path: &str) -> Result<Rewriter<'a>> {
        Ok(Rewriter {
            posts_root,
            base: posts_root.join(source_path)?,
        })
    }

    /// Rewrites a single reference target. The input may be absolute or
    /// relative; the output is always an absolute, normalized URL string.
    pub fn rewrite(&self, target: &str) -> Result<String> {
        let absolute = match Url::parse(target) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => self.base.join(target)?,
            Err(e) => return Err(e),
        };
        Ok(self.to_page_url(absolute).to_string())
    }

    /// Turns references to markdown sources under `posts_root` into the URLs
    /// of the pages they compile to: `foo.md` and `foo/index.md` both become
    /// `foo.html`. Anything outside `posts_root` (or not markdown) is
    /// returned as-is.
    fn to_page_url(&self, absolute: Url) -> Url {
        if let Some(relative) = self.posts_root.make_relative(&absolute) {
            if !relative.starts_with("../") && relative.ends_with(MARKDOWN_EXTENSION) {
                let page = match Self::bundle_slug(&relative) {
                    Some(slug) => slug,
                    None => relative.trim_end_matches(MARKDOWN_EXTENSION),
                };
                // joining a slug onto posts_root can't fail
                return self
                    .posts_root
                    .join(&format!("{}{}", page, HTML_EXTENSION))
                    .unwrap();
            }
        }
        absolute
    }

    /// Returns the bundle slug for a posts-relative path of the form
    /// `{slug}/index.md`; `None` for anything else.
    fn bundle_slug(relative: &str) -> Option<&str> {
        let slug = relative.trim_end_matches("/index.md");
        if slug == relative || slug.contains('/') {
            None
        } else {
            Some(slug)
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;
