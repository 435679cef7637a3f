//! Markdown support: rendering post bodies to HTML (with link and image
//! targets rewritten to their stable output URLs) and flattening bodies to
//! plain text for the search index and the reading-time estimate.

use crate::url::Rewriter;
use pulldown_cmark::*;
use std::fmt;
use std::io;
use url::{ParseError as UrlParseError, Url};

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown to HTML, appending the result onto `out`.
///
/// * `posts_url` is the prefix for post URLs (e.g.,
///   `https://example.org/posts/`). This should end in a trailing slash.
/// * `source_path` is the relative path to the source file from the posts
///   directory; relative references resolve against it.
/// * `markdown` is the body of the source file.
pub fn to_html(
    out: &mut String,
    posts_url: &Url,
    source_path: &str,
    markdown: &str,
) -> Result<(), Error> {
    let converter = EventConverter {
        rewriter: Rewriter::new(posts_url, source_path)?,
    };
    let events = Parser::new_ext(markdown, parser_options())
        .map(|ev| converter.convert(ev))
        .collect::<Result<Vec<Event>, UrlParseError>>()?;
    html::push_html(out, events.into_iter());
    Ok(())
}

/// Flattens markdown to plain text: the text the reader would actually read.
/// Code blocks, inline code spans, and raw HTML are dropped; link and
/// emphasis text is kept without its markup; whitespace runs collapse to
/// single spaces.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::new();
    let mut in_code_block = false;
    for ev in Parser::new_ext(markdown, parser_options()) {
        match ev {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(Tag::CodeBlock(_)) => in_code_block = false,
            Event::Text(t) => {
                if !in_code_block {
                    text.push_str(&t);
                    text.push(' ');
                }
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item) => text.push(' '),
            // inline code, raw HTML, and everything structural are invisible
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

struct EventConverter<'a> {
    rewriter: Rewriter<'a>,
}

impl<'a> EventConverter<'a> {
    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, UrlParseError> {
        Ok(match tag {
            // The headings in the post itself need to be demoted twice to be
            // subordinate to both the site title (h1) and the post title
            // (h2), so `#` becomes h3 instead of h1.
            Tag::Heading(s) => Tag::Heading(s + 2),

            // Internal references (links from posts *to* posts and assets)
            // need to be converted from their source form to their output
            // form (e.g., a post linking to another post as `foo.md` links
            // to `foo.html` in the output).
            Tag::Link(
                link @ (LinkType::Inline
                | LinkType::Reference
                | LinkType::ReferenceUnknown
                | LinkType::Shortcut
                | LinkType::Autolink
                | LinkType::Collapsed
                | LinkType::CollapsedUnknown),
                url,
                title,
            ) => Tag::Link(
                link,
                CowStr::Boxed(self.rewriter.rewrite(&url)?.into_boxed_str()),
                title,
            ),

            // Image targets get the same treatment so bundle-relative assets
            // (`assets/diagram.png`) resolve under the post's own URL.
            Tag::Image(link, url, title) => Tag::Image(
                link,
                CowStr::Boxed(self.rewriter.rewrite(&url)?.into_boxed_str()),
                title,
            ),
            _ => tag,
        })
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Result<Event<'b>, UrlParseError> {
        Ok(match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            Event::End(tag) => Event::End(self.convert_tag(tag)?),
            _ => ev,
        })
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O errors.
    Io(std::io::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`UrlParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator for I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(source_path: &str, markdown: &str) -> String {
        let posts_url = Url::parse("https://example.org/posts/").unwrap();
        let mut out = String::new();
        to_html(&mut out, &posts_url, source_path, markdown).unwrap();
        out
    }

    #[test]
    fn test_rewrites_relative_image() {
        let html = render(
            "hello-world/index.md",
            "![diagram](assets/diagram.png)",
        );
        assert!(
            html.contains("https://example.org/posts/hello-world/assets/diagram.png"),
            "got: {}",
            html
        );
    }

    #[test]
    fn test_rewrites_markdown_link_to_page() {
        let html = render("hello-world/index.md", "[other](../other-post.md)");
        assert!(
            html.contains("href=\"https://example.org/posts/other-post.html\""),
            "got: {}",
            html
        );
    }

    #[test]
    fn test_demotes_headings() {
        let html = render("a.md", "# Title");
        assert!(html.contains("<h3>"), "got: {}", html);
    }

    #[test]
    fn test_plain_text_skips_code() {
        let text = plain_text("Intro text.\n\n```rust\nfn secret() {}\n```\n\nAfter `inline` code.");
        assert_eq!(text, "Intro text. After code.");
    }

    #[test]
    fn test_plain_text_keeps_link_text_only() {
        let text = plain_text("See [the docs](https://example.org/docs) for more.");
        assert_eq!(text, "See the docs for more.");
    }

    #[test]
    fn test_plain_text_drops_html_and_markers() {
        let text = plain_text("## Heading\n\n- first\n- second\n\n<aside>ignored</aside>");
        assert_eq!(text, "Heading first second");
    }
}
