//! Project configuration: locating and loading `stele.yaml`, the theme
//! manifest next to it, and resolving everything into the absolute paths
//! and URLs the rest of the build consumes.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct FeedLength(usize);
impl Default for FeedLength {
    fn default() -> Self {
        FeedLength(50)
    }
}

/// The site author, surfaced to templates.
#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,

    #[serde(default)]
    home_page: String,

    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default)]
    feed_length: FeedLength,

    /// Free-form settings for the third-party comments widget, passed
    /// through to the post template verbatim.
    #[serde(default)]
    comments: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// The fully-resolved build configuration.
pub struct Config {
    pub title: String,
    pub description: String,
    pub author: Option<Author>,
    pub comments: Option<BTreeMap<String, String>>,

    pub site_root: Url,
    pub home_page: Url,

    pub posts_source_directory: PathBuf,
    pub posts_url: Url,
    pub posts_template: Vec<PathBuf>,
    pub posts_output_directory: PathBuf,

    pub index_url: Url,
    pub index_template: Vec<PathBuf>,
    pub index_output_directory: PathBuf,
    pub index_page_size: usize,

    pub static_source_directory: PathBuf,
    pub static_url: Url,
    pub static_output_directory: PathBuf,

    pub root_output_directory: PathBuf,
    pub feed_url: Url,
    pub feed_length: usize,

    pub include_drafts: bool,
}

impl Config {
    /// Finds `stele.yaml` in `dir` or the nearest ancestor directory and
    /// loads the configuration from it.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        include_drafts: bool,
    ) -> Result<Config> {
        let path = dir.join("stele.yaml");
        if path.exists() {
            match Config::from_project_file(&path, output_directory, include_drafts) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match path.parent().and_then(|p| p.parent()) {
                Some(dir) => Config::from_directory(dir, output_directory, include_drafts),
                None => Err(anyhow!(
                    "Could not find `stele.yaml` in any parent directory"
                )),
            }
        }
    }

    /// Loads the configuration from a specific project file.
    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        include_drafts: bool,
    ) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| {
                anyhow!(
                    "Can't get parent directory for provided project file path '{:?}'",
                    path
                )
            })?;

        let theme_dir = project_root.join("theme");
        let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
        let theme: Theme = serde_yaml::from_reader(theme_file)?;

        let site_root = ensure_trailing_slash(project.site_root);
        Ok(Config {
            home_page: site_root.join(&project.home_page)?,
            posts_url: site_root.join("posts/")?,
            index_url: site_root.join("pages/")?,
            static_url: site_root.join("static/")?,
            feed_url: site_root.join("rss.xml")?,
            site_root,
            title: project.title,
            description: project.description,
            author: project.author,
            comments: project.comments,
            posts_source_directory: project_root.join("posts"),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_source_directory: theme_dir.join("static"),
            posts_output_directory: output_directory.join("posts"),
            index_output_directory: output_directory.join("pages"),
            static_output_directory: output_directory.join("static"),
            root_output_directory: output_directory.to_owned(),
            index_page_size: std::cmp::max(1, project.index_page_size.0),
            feed_length: project.feed_length.0,
            include_drafts,
        })
    }
}

// Url::join treats a base without a trailing slash as a file, which would
// make `{site_root}/posts/` resolve beside the site root instead of under
// it.
fn ensure_trailing_slash(url: Url) -> Url {
    if url.path().ends_with('/') {
        url
    } else {
        let mut url = url;
        url.set_path(&format!("{}/", url.path()));
        url
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_project_fixture() -> Result<()> {
        let config = Config::from_directory(
            Path::new("./testdata/project"),
            Path::new("/tmp/out"),
            false,
        )?;
        assert_eq!(config.title, "Example Blog");
        assert_eq!(config.site_root.as_str(), "https://example.org/");
        assert_eq!(config.posts_url.as_str(), "https://example.org/posts/");
        assert_eq!(config.index_url.as_str(), "https://example.org/pages/");
        assert_eq!(config.feed_url.as_str(), "https://example.org/rss.xml");
        assert_eq!(config.index_page_size, 5);
        assert_eq!(config.feed_length, 50);
        assert!(config
            .posts_template
            .iter()
            .all(|p| p.starts_with("./testdata/project/theme")));
        assert_eq!(
            config.comments.as_ref().and_then(|c| c.get("provider")),
            Some(&"giscus".to_owned())
        );
        Ok(())
    }

    #[test]
    fn test_search_ascends_to_project_file() -> Result<()> {
        let config = Config::from_directory(
            Path::new("./testdata/project/posts"),
            Path::new("/tmp/out"),
            true,
        )?;
        assert_eq!(config.title, "Example Blog");
        assert!(config.include_drafts);
        Ok(())
    }

    #[test]
    fn test_trailing_slash_is_enforced() {
        let url = ensure_trailing_slash(Url::parse("https://example.org/blog").unwrap());
        assert_eq!(url.as_str(), "https://example.org/blog/");
        assert_eq!(
            url.join("posts/").unwrap().as_str(),
            "https://example.org/blog/posts/"
        );
    }
}
