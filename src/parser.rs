//! Defines the [`Parser`] and [`Error`] types plus the logic for reading the
//! content store into [`Post`] values: locating bundles, splitting and
//! validating frontmatter, normalizing dates and tags, computing the derived
//! reading-time and search-text fields, rendering bodies, and collecting
//! bundle assets.

use std::{
    collections::HashSet,
    fmt,
    fs::{read_dir, File},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Deserialize;
use url::Url;

use crate::{index, markdown, post::Post, tag::Tag};

const MARKDOWN_EXTENSION: &str = ".md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `tags_url` is the base URL for tag listing pages (the first page of a
    /// tag lives at `{tags_url}{tag_slug}/index.html`).
    tags_url: &'a Url,

    /// `posts_url` is the base URL for post pages (a post page lives at
    /// `{posts_url}{slug}.html`).
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,

    /// Whether posts flagged `draft: true` are kept or dropped.
    include_drafts: bool,
}

/// A bundle asset scheduled for copying: source path, output path.
pub type StaticAsset = (PathBuf, PathBuf);

/// Everything parsing produces: the posts, ordered by date descending and
/// title ascending, plus the bundle assets to copy beside them.
pub type Posts = (Vec<Post>, Vec<StaticAsset>);

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(
        tags_url: &'a Url,
        posts_url: &'a Url,
        posts_directory: &'a Path,
        include_drafts: bool,
    ) -> Parser<'a> {
        Parser {
            tags_url,
            posts_url,
            posts_directory,
            include_drafts,
        }
    }

    /// Searches `source_directory` for posts and returns them ordered by
    /// date (most recent first; title breaks ties) together with their
    /// bundle assets. A post is either a *bundle* (a directory containing
    /// `index.md`, optionally with co-located asset files) or a bare `.md`
    /// file. Each source must be structured as:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date`, `description`, and
    ///    optionally `image`, `tags`, and `draft`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2024-04-16
    /// description: A greeting.
    /// tags: [greetings]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Posts> {
        let mut posts = Vec::new();
        let mut assets = Vec::new();
        for result in read_dir(source_directory)? {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if Self::is_bundle(&entry)? {
                if let Some(post) = self.parse_bundle(
                    source_directory,
                    // strip_prefix() should never fail
                    entry.path().strip_prefix(source_directory).unwrap(),
                    &mut assets,
                )? {
                    posts.push(post);
                }
            } else if file_name.ends_with(MARKDOWN_EXTENSION) {
                if let Some(post) = self.parse_post(
                    source_directory,
                    // should never fail
                    entry.path().strip_prefix(source_directory).unwrap(),
                )? {
                    posts.push(post);
                }
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
        Ok((posts, assets))
    }

    fn is_bundle(entry: &std::fs::DirEntry) -> std::io::Result<bool> {
        Ok(entry.file_type()?.is_dir() && entry.path().join("index.md").is_file())
    }

    fn parse_bundle(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
        assets: &mut Vec<StaticAsset>,
    ) -> Result<Option<Post>> {
        // Make sure the post parses before mutating `assets`.
        let post = match self.parse_post(
            posts_source_directory,
            &relative_path.join("index.md"),
        )? {
            None => return Ok(None),
            Some(post) => post,
        };

        use walkdir::WalkDir;
        let abs = posts_source_directory.join(relative_path);
        for result in WalkDir::new(&abs) {
            let entry = result?;
            if entry.file_type().is_file() && entry.file_name() != "index.md" {
                assets.push((
                    entry.path().to_owned(),
                    self.posts_directory
                        .join(&post.slug)
                        // strip_prefix can't fail; `abs` is always an
                        // ancestor of the entry path
                        .join(entry.path().strip_prefix(&abs).unwrap()),
                ));
            }
        }

        Ok(Some(post))
    }

    /// Parses a single post source file. Returns `Ok(None)` for drafts when
    /// drafts are excluded. The slug is the bundle directory name or the
    /// file stem (the post for `{posts}/foo/index.md` or `{posts}/foo.md`
    /// is `foo`).
    fn parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Option<Post>> {
        match self._parse_post(posts_source_directory, relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{:?}`", relative_path),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Option<Post>> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))?
            .read_to_string(&mut contents)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let slug = post_slug(relative_path)?;
        let frontmatter = frontmatter.validate(&slug)?;

        if frontmatter.draft && !self.include_drafts {
            return Ok(None);
        }

        let mut tags: Vec<Tag> = Vec::with_capacity(frontmatter.tags.len());
        let mut seen: HashSet<String> = HashSet::new();
        for display in &frontmatter.tags {
            let tag = Tag::new(display, self.tags_url)?;
            // duplicate slugs within one post collapse; first spelling wins
            if !tag.slug.is_empty() && seen.insert(tag.slug.clone()) {
                tags.push(tag);
            }
        }

        let body_source = &input[body_start..];
        let plain = markdown::plain_text(body_source);
        let tag_displays: Vec<&str> = tags.iter().map(|t| t.display.as_str()).collect();

        let mut post = Post {
            url: self.posts_url.join(&format!("{}.html", slug))?,
            file_path: self.posts_directory.join(format!("{}.html", slug)),
            title: frontmatter.title.clone(),
            date: frontmatter.date,
            description: frontmatter.description.clone(),
            image: frontmatter.image,
            draft: frontmatter.draft,
            reading_time: index::reading_time(&plain),
            search_text: index::search_text(
                &frontmatter.title,
                &frontmatter.description,
                &tag_displays,
                &plain,
            ),
            tags,
            slug,
            body: String::default(),
        };

        let source_path = relative_path.to_string_lossy();
        markdown::to_html(&mut post.body, self.posts_url, &source_path, body_source)?;
        Ok(Some(post))
    }
}

/// Locates the frontmatter fences. Returns (yaml_start, yaml_stop,
/// body_start) byte offsets.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find("---") {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                        // yaml_start
            FENCE.len() + offset,               // yaml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )),
    }
}

/// Derives the post slug from its source path relative to the posts
/// directory: the bundle directory name, or the file stem.
fn post_slug(relative_path: &Path) -> Result<String> {
    let path = if relative_path.ends_with("index.md") {
        match relative_path.parent() {
            Some(parent) => parent.to_owned(),
            None => return Err(Error::InvalidFileName(relative_path.to_owned())),
        }
    } else {
        relative_path.with_extension("")
    };
    match path.file_name().and_then(|name| name.to_str()) {
        Some(slug) if !slug.is_empty() => Ok(slug.to_owned()),
        _ => Err(Error::InvalidFileName(relative_path.to_owned())),
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    date: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    image: Option<String>,

    #[serde(default)]
    tags: Vec<String>,

    #[serde(default)]
    draft: bool,
}

/// Frontmatter after validation: required fields present and trimmed, the
/// date normalized.
struct ValidFrontmatter {
    title: String,
    date: NaiveDate,
    description: String,
    image: Option<String>,
    tags: Vec<String>,
    draft: bool,
}

impl Frontmatter {
    /// Checks the required fields all at once so the error names every
    /// missing field, not just the first.
    fn validate(self, slug: &str) -> Result<ValidFrontmatter> {
        let title = self.title.map(|t| t.trim().to_owned()).unwrap_or_default();
        let date_raw = self.date.map(|d| d.trim().to_owned()).unwrap_or_default();
        let description = self
            .description
            .map(|d| d.trim().to_owned())
            .unwrap_or_default();

        let mut missing = Vec::new();
        if title.is_empty() {
            missing.push("title");
        }
        if date_raw.is_empty() {
            missing.push("date");
        }
        if description.is_empty() {
            missing.push("description");
        }
        if !missing.is_empty() {
            return Err(Error::MissingFields {
                slug: slug.to_owned(),
                fields: missing,
            });
        }

        Ok(ValidFrontmatter {
            date: normalize_date(&date_raw).ok_or_else(|| Error::InvalidDate {
                slug: slug.to_owned(),
                value: date_raw,
            })?,
            image: self
                .image
                .map(|i| i.trim().to_owned())
                .filter(|i| !i.is_empty()),
            tags: self
                .tags
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            draft: self.draft,
            title,
            description,
        })
    }
}

/// Accepts the date spellings the content store has accumulated over the
/// years and reduces them all to a calendar date.
fn normalize_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.naive_utc().date());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    None
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when required frontmatter fields are missing or empty.
    MissingFields {
        slug: String,
        fields: Vec<&'static str>,
    },

    /// Returned when a frontmatter date can't be understood.
    InvalidDate { slug: String, value: String },

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8 or has no stem.
    InvalidFileName(PathBuf),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::MissingFields { slug, fields } => write!(
                f,
                "Post '{}' is missing required frontmatter fields: {}",
                slug,
                fields.join(", ")
            ),
            Error::InvalidDate { slug, value } => {
                write!(f, "Post '{}' has an invalid date: '{}'", slug, value)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        match err {
            markdown::Error::Io(e) => Error::Io(e),
            markdown::Error::UrlParse(e) => Error::UrlParse(e),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
