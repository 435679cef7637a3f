//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: parsing the posts
//! ([`crate::parser`]), building the metadata index ([`crate::index`]),
//! rendering listing and post pages ([`crate::write`]), copying bundle and
//! theme assets, and generating the feed, the sitemap, and the JSON index
//! the browser's search widget downloads.

use crate::config::Config;
use crate::feed::{write_feed, FeedConfig};
use crate::index::Index;
use crate::parser::{Error as ParseError, Parser as PostParser, StaticAsset};
use crate::sitemap::{write_sitemap, SitemapConfig};
use crate::write::{Error as WriteError, SiteContext, Writer};
use gtmpl::{Template, Value};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Builds the site from a [`Config`] object. This calls into
/// [`PostParser::parse_posts`] and [`Writer::write_posts`] which do the
/// heavy lifting; everything else here is plumbing between them and disk.
pub fn build_site(config: Config) -> Result<()> {
    let post_parser = PostParser::new(
        &config.index_url,
        &config.posts_url,
        &config.posts_output_directory,
        config.include_drafts,
    );

    // collect all posts
    let (posts, assets) = post_parser.parse_posts(&config.posts_source_directory)?;
    info!(posts = posts.len(), assets = assets.len(), "parsed content store");

    // the one index everything else is derived from
    let index = Index::from_posts(&posts);

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // We probably don't want to naively delete the whole root output
    // directory in case the user accidentally passes the wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;
    std::fs::create_dir_all(&config.root_output_directory)?;

    // write the post and listing pages
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_page_size: config.index_page_size,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        site: SiteContext {
            home_page: &config.home_page,
            static_url: &config.static_url,
            title: &config.title,
            description: &config.description,
            author: author_value(&config),
            comments: comments_value(&config),
        },
    };
    writer.write_posts(&posts)?;
    debug!("wrote post and listing pages");

    // copy bundle assets next to their posts
    copy_assets(&assets)?;

    // copy the theme's static directory, if the theme has one
    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        &config.index_output_directory.join("index.html"),
        &config.root_output_directory.join("index.html"),
    )?;

    // emit the metadata/search index the browser widget consumes
    index.write_json(File::create(
        config.root_output_directory.join("posts-index.json"),
    )?)?;

    // create the RSS feed
    write_feed(
        &FeedConfig {
            title: config.title.clone(),
            description: config.description.clone(),
            home_page: config.home_page.clone(),
            feed_url: config.feed_url.clone(),
            length: config.feed_length,
        },
        &posts,
        File::create(config.root_output_directory.join("rss.xml"))?,
    )?;

    // create the sitemap
    write_sitemap(
        &SitemapConfig {
            site_root: &config.site_root,
            index_url: &config.index_url,
            total_index_pages: total_pages(posts.len(), config.index_page_size),
        },
        &posts,
        &index.tags,
        File::create(config.root_output_directory.join("sitemap.xml"))?,
    )?;

    info!(
        output = %config.root_output_directory.display(),
        "site built"
    );
    Ok(())
}

fn total_pages(posts: usize, page_size: usize) -> usize {
    std::cmp::max(1, (posts + page_size - 1) / page_size)
}

fn author_value(config: &Config) -> Value {
    use std::collections::HashMap;
    match &config.author {
        None => Value::Nil,
        Some(author) => {
            let mut m: HashMap<String, Value> = HashMap::new();
            m.insert("name".to_owned(), (&author.name).into());
            m.insert(
                "email".to_owned(),
                match &author.email {
                    Some(email) => email.into(),
                    None => Value::Nil,
                },
            );
            Value::Object(m)
        }
    }
}

fn comments_value(config: &Config) -> Value {
    use std::collections::HashMap;
    match &config.comments {
        None => Value::Nil,
        Some(settings) => Value::Object(
            settings
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect::<HashMap<String, Value>>(),
        ),
    }
}

fn copy_assets(assets: &[StaticAsset]) -> Result<()> {
    for (src, dst) in assets {
        if let Some(dir) = dst.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(src, dst)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&src.join(entry.file_name()), &dst.join(entry.file_name()))?;
        } else {
            std::fs::copy(src.join(entry.file_name()), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the
// result into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// writing, cleaning output directories, parsing template files, and other
/// I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors writing [`crate::post::Post`]s to disk as HTML
    /// files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    /// End-to-end: build the fixture project into a temp directory and
    /// check every artifact class lands where the URLs say it should.
    #[test]
    fn test_build_site_fixture() {
        let output = tempfile::tempdir().unwrap();
        let config = Config::from_directory(
            Path::new("./testdata/project"),
            output.path(),
            false,
        )
        .unwrap();
        build_site(config).unwrap();

        for artifact in &[
            "index.html",
            "pages/index.html",
            "pages/meta/index.html",
            "posts/first-post.html",
            "static/style.css",
            "posts-index.json",
            "rss.xml",
            "sitemap.xml",
        ] {
            assert!(
                output.path().join(artifact).is_file(),
                "missing artifact: {}",
                artifact
            );
        }

        let page = std::fs::read_to_string(output.path().join("posts/first-post.html")).unwrap();
        assert!(page.contains("First post"));
        assert!(page.contains("2024-02-14"));

        let index = std::fs::read_to_string(output.path().join("posts-index.json")).unwrap();
        assert!(index.contains("\"slug\": \"first-post\""));

        // rebuilding over the same input must be idempotent for the
        // deterministic artifacts
        let first = std::fs::read(output.path().join("posts-index.json")).unwrap();
        let config = Config::from_directory(
            Path::new("./testdata/project"),
            output.path(),
            false,
        )
        .unwrap();
        build_site(config).unwrap();
        let second = std::fs::read(output.path().join("posts-index.json")).unwrap();
        assert_eq!(first, second);
    }
}
