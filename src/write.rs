//! Responsible for turning parsed posts into output HTML files: one page
//! per post, the paginated main listing, and a paginated listing per tag.

use crate::post::Post;
use gtmpl::{Template, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Site-wide values injected into every page's template context.
pub struct SiteContext<'a> {
    /// The URL for the site's home page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The site title.
    pub title: &'a str,

    /// The site description.
    pub description: &'a str,

    /// The site author (`name`/`email` object), or `Nil`.
    pub author: Value,

    /// The comments-widget settings, passed through for the theme's embed
    /// script. `Nil` when comments are disabled.
    pub comments: Value,
}

impl SiteContext<'_> {
    fn inject(&self, value: &mut Value) {
        if let Value::Object(obj) = value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert("site_title".to_owned(), self.title.into());
            obj.insert("site_description".to_owned(), self.description.into());
            obj.insert("site_author".to_owned(), self.author.clone());
            obj.insert("comments".to_owned(), self.comments.clone());
        }
    }
}

/// Responsible for indexing, templating, and writing HTML pages to disk
/// from [`Post`] sources.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The base URL for listing pages. The main listing pages are located
    /// at `{index_base_url}index.html`, `{index_base_url}1.html`, etc.; the
    /// tag listing pages at `{index_base_url}{tag_slug}/index.html`,
    /// `{index_base_url}{tag_slug}/1.html`, etc.
    pub index_base_url: &'a Url,

    /// The directory in which the listing HTML files will be written,
    /// mirroring the URL layout above.
    pub index_output_directory: &'a Path,

    /// The number of posts per listing page.
    pub index_page_size: usize,

    /// Site-wide template values.
    pub site: SiteContext<'a>,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        self.site.inject(&mut value);
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value).unwrap(),
        )?;
        Ok(())
    }

    /// Takes a slice of [`Post`]s (ordered most-recent-first), groups them
    /// into listings, and writes every post and listing page to disk.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        use std::collections::HashSet;
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        pages(
            posts,
            self.index_base_url,
            self.index_output_directory,
            self.index_page_size,
            self.posts_template,
            self.index_template,
        )?
        .map(|page| {
            let dir = page.file_path.parent().unwrap(); // there is always a dir
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
            self.write_page(&page)
        })
        .collect()
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted
/// to a [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page: a post object for post pages, an array
    /// of post summaries for listing pages.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]: a [`Value::Object`] with fields
    /// `item`, `prev`, and `next` (see [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// Creates all of the listing and post [`Page`]s for a set of [`Post`]s.
/// See [`Writer`] for a description of arguments.
fn pages<'a>(
    posts: &'a [Post],
    index_base_url: &Url,
    index_output_directory: &Path,
    index_page_size: usize,
    posts_template: &'a Template,
    index_template: &'a Template,
) -> Result<impl Iterator<Item = Page<'a>>> {
    Ok(listing_pages(
        posts,
        index_base_url,
        index_output_directory,
        index_page_size,
        index_template,
    )?
    .into_iter()
    .chain(post_pages(posts, posts_template)))
}

/// Creates all of the post [`Page`]s for a set of [`Post`]s. Takes the
/// posts and the post template as arguments.
fn post_pages<'a>(posts: &'a [Post], template: &'a Template) -> impl Iterator<Item = Page<'a>> {
    posts.iter().enumerate().map(move |(i, post)| Page {
        item: post.to_value(),
        file_path: post.file_path.clone(),
        prev: match i < 1 {
            true => None,
            false => Some(posts[i - 1].url.clone()),
        },
        next: match i >= posts.len() - 1 {
            true => None,
            false => Some(posts[i + 1].url.clone()),
        },
        template,
    })
}

/// Creates all of the listing [`Page`]s for a set of [`Post`]s: the main
/// listing plus one listing per tag.
fn listing_pages<'a>(
    posts: &'a [Post],
    index_base_url: &Url,
    index_output_directory: &Path,
    index_page_size: usize,
    index_template: &'a Template,
) -> Result<Vec<Page<'a>>> {
    let mut out = Vec::new();
    for listing in group_listings(index_base_url, index_output_directory, posts)? {
        out.extend(listing.to_pages(index_page_size, index_template));
    }
    Ok(out)
}

/// `Listing` represents the collection of [`Post`]s associated with a tag
/// (including the empty tag, which is the main listing containing all
/// posts).
struct Listing<'a> {
    /// The base URL for the listing's pages.
    url: Url,

    /// The output directory for the listing's pages.
    output_directory: PathBuf,

    /// The posts in the listing, most recent first.
    posts: Vec<&'a Post>,
}

impl<'a> Listing<'a> {
    /// Converts the listing into its paginated pages. `index_page_size` and
    /// `index_template` are the number of posts per page and the template
    /// to apply respectively.
    fn to_pages<'t>(&self, index_page_size: usize, index_template: &'t Template) -> Vec<Page<'t>> {
        // an empty listing still gets its landing page
        if self.posts.is_empty() {
            return vec![Page {
                item: Value::Array(Vec::new()),
                file_path: self.output_directory.join("index.html"),
                prev: None,
                next: None,
                template: index_template,
            }];
        }

        let total_pages = match self.posts.len() % index_page_size {
            0 => self.posts.len() / index_page_size,
            _ => self.posts.len() / index_page_size + 1,
        };

        self.posts
            .chunks(index_page_size)
            .enumerate()
            .map(|(i, chunk)| {
                let file_name = match i > 0 {
                    false => String::from("index.html"),
                    true => format!("{}.html", i),
                };

                Page {
                    item: Value::Array(chunk.iter().map(|p| p.summarize()).collect()),
                    file_path: self.output_directory.join(&file_name),
                    prev: match i {
                        0 => None,
                        // these joins can't fail; the names are our own
                        1 => Some(self.url.join("index.html").unwrap()),
                        _ => Some(self.url.join(&format!("{}.html", i - 1)).unwrap()),
                    },
                    next: match i < total_pages - 1 {
                        false => None,
                        true => Some(self.url.join(&format!("{}.html", i + 1)).unwrap()),
                    },
                    template: index_template,
                }
            })
            .collect()
    }
}

/// Groups a list of [`Post`]s into listings: the main listing first, then
/// one per tag, ordered by tag slug so output generation is deterministic.
fn group_listings<'a>(
    base_url: &Url,
    base_directory: &Path,
    posts: &'a [Post],
) -> Result<Vec<Listing<'a>>> {
    let mut by_tag: BTreeMap<&str, Listing> = BTreeMap::new();
    for post in posts {
        for tag in post.tags.iter() {
            match by_tag.get_mut(tag.slug.as_str()) {
                None => {
                    by_tag.insert(
                        &tag.slug,
                        Listing {
                            url: base_url.join(&format!("{}/", tag.slug))?,
                            output_directory: base_directory.join(&tag.slug),
                            posts: vec![post],
                        },
                    );
                }
                Some(listing) => {
                    listing.posts.push(post);
                }
            }
        }
    }

    let mut listings = Vec::with_capacity(by_tag.len() + 1);
    listings.push(Listing {
        url: base_url.clone(),
        output_directory: base_directory.to_owned(),
        posts: posts.iter().collect(),
    });
    listings.extend(by_tag.into_iter().map(|(_, listing)| listing));
    Ok(listings)
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error building page URLs.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`].
    /// This allows us to use the `?` operator for fallible template
    /// operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator when building page URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::sample;
    use crate::tag::Tag;

    fn template() -> Template {
        let mut template = Template::default();
        template.parse("ok").unwrap();
        template
    }

    fn base_url() -> Url {
        Url::parse("https://example.org/pages/").unwrap()
    }

    #[test]
    fn test_listing_pagination_boundaries() {
        let posts: Vec<Post> = (0..5)
            .map(|i| sample(&format!("p{}", i), &format!("P{}", i), "2024-01-01"))
            .collect();
        let listing = Listing {
            url: base_url(),
            output_directory: PathBuf::from("/tmp/pages"),
            posts: posts.iter().collect(),
        };

        let template = template();
        let pages = listing.to_pages(2, &template);
        assert_eq!(pages.len(), 3);

        assert_eq!(pages[0].file_path, Path::new("/tmp/pages/index.html"));
        assert!(pages[0].prev.is_none());
        assert_eq!(
            pages[0].next.as_ref().map(|u| u.as_str()),
            Some("https://example.org/pages/1.html")
        );

        assert_eq!(pages[1].file_path, Path::new("/tmp/pages/1.html"));
        assert_eq!(
            pages[1].prev.as_ref().map(|u| u.as_str()),
            Some("https://example.org/pages/index.html")
        );

        assert_eq!(pages[2].file_path, Path::new("/tmp/pages/2.html"));
        assert!(pages[2].next.is_none());
    }

    #[test]
    fn test_empty_listing_still_has_a_landing_page() {
        let listing = Listing {
            url: base_url(),
            output_directory: PathBuf::from("/tmp/pages"),
            posts: Vec::new(),
        };
        let template = template();
        let pages = listing.to_pages(10, &template);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].file_path, Path::new("/tmp/pages/index.html"));
    }

    #[test]
    fn test_group_listings_is_deterministic_and_complete() {
        let tags_url = base_url();
        let mut tagged = sample("tagged", "Tagged", "2024-02-01");
        tagged.tags = vec![
            Tag::new("Zig", &tags_url).unwrap(),
            Tag::new("Ada", &tags_url).unwrap(),
        ];
        let untagged = sample("untagged", "Untagged", "2024-01-01");
        let posts = vec![tagged, untagged];

        let listings =
            group_listings(&base_url(), Path::new("/tmp/pages"), &posts).unwrap();
        assert_eq!(listings.len(), 3);
        // the main listing leads and holds everything
        assert_eq!(listings[0].posts.len(), 2);
        // tag listings follow in slug order
        assert_eq!(listings[1].output_directory, Path::new("/tmp/pages/ada"));
        assert_eq!(listings[2].output_directory, Path::new("/tmp/pages/zig"));
        assert_eq!(
            listings[1].url.as_str(),
            "https://example.org/pages/ada/"
        );
    }

    #[test]
    fn test_post_pages_link_neighbors() {
        let posts: Vec<Post> = (0..3)
            .map(|i| sample(&format!("p{}", i), &format!("P{}", i), "2024-01-01"))
            .collect();
        let template = template();
        let pages: Vec<Page> = post_pages(&posts, &template).collect();

        assert!(pages[0].prev.is_none());
        assert_eq!(
            pages[1].prev.as_ref().map(|u| u.as_str()),
            Some("https://example.org/posts/p0.html")
        );
        assert_eq!(
            pages[1].next.as_ref().map(|u| u.as_str()),
            Some("https://example.org/posts/p2.html")
        );
        assert!(pages[2].next.is_none());
    }
}
