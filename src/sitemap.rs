//! Support for generating `sitemap.xml` from the parsed posts: the site
//! root, the listing and its paginated pages, every tag listing, and every
//! post page, each with the change frequency and priority appropriate to
//! its route class.

use crate::index::TagSummary;
use crate::post::Post;
use crate::util::xml_escape;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating the sitemap.
pub struct SitemapConfig<'a> {
    /// The site root URL (the home page entry).
    pub site_root: &'a Url,

    /// The base URL for listing pages; also where tag listings live.
    pub index_url: &'a Url,

    /// How many paginated listing pages the site has.
    pub total_index_pages: usize,
}

/// Creates a sitemap from configuration, posts (most-recent-first), and the
/// tag summary table, and writes the result to a [`std::io::Write`].
pub fn write_sitemap<W: Write>(
    config: &SitemapConfig,
    posts: &[Post],
    tags: &[TagSummary],
    mut w: W,
) -> Result<()> {
    w.write_all(sitemap(config, posts, tags).as_bytes())
}

fn sitemap(config: &SitemapConfig, posts: &[Post], tags: &[TagSummary]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    xml.push_str(&entry(config.site_root.as_str(), None, "weekly", "1.0"));
    xml.push_str(&entry(config.index_url.as_str(), None, "weekly", "0.9"));

    // the first listing page is the listing itself; only deeper pages get
    // their own entries
    for page in 1..config.total_index_pages {
        // joining a page number onto index_url can't fail
        let loc = config.index_url.join(&format!("{}.html", page)).unwrap();
        xml.push_str(&entry(loc.as_str(), None, "weekly", "0.7"));
    }

    for tag in tags {
        let loc = config
            .index_url
            .join(&format!("{}/index.html", tag.slug))
            .unwrap();
        xml.push_str(&entry(loc.as_str(), None, "weekly", "0.6"));
    }

    for post in posts {
        xml.push_str(&entry(
            post.url.as_str(),
            Some(post.date_string()),
            "monthly",
            "0.8",
        ));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn entry(loc: &str, lastmod: Option<String>, changefreq: &str, priority: &str) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(loc)));
    if let Some(lastmod) = lastmod {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
    }
    xml.push_str(&format!("    <changefreq>{}</changefreq>\n", changefreq));
    xml.push_str(&format!("    <priority>{}</priority>\n", priority));
    xml.push_str("  </url>\n");
    xml
}

type Result<T> = std::result::Result<T, std::io::Error>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::sample;

    #[test]
    fn test_sitemap_routes() {
        let site_root = Url::parse("https://example.org/").unwrap();
        let index_url = Url::parse("https://example.org/pages/").unwrap();
        let config = SitemapConfig {
            site_root: &site_root,
            index_url: &index_url,
            total_index_pages: 3,
        };
        let posts = vec![sample("hello-world", "Hello, world!", "2024-05-02")];
        let tags = vec![TagSummary {
            slug: "greetings".to_owned(),
            display: "Greetings".to_owned(),
            count: 1,
        }];

        let xml = sitemap(&config, &posts, &tags);
        assert!(xml.contains("<loc>https://example.org/</loc>"));
        assert!(xml.contains("<loc>https://example.org/pages/</loc>"));
        assert!(xml.contains("<loc>https://example.org/pages/1.html</loc>"));
        assert!(xml.contains("<loc>https://example.org/pages/2.html</loc>"));
        assert!(!xml.contains("<loc>https://example.org/pages/3.html</loc>"));
        assert!(xml.contains("<loc>https://example.org/pages/greetings/index.html</loc>"));
        assert!(xml.contains("<loc>https://example.org/posts/hello-world.html</loc>"));
        assert!(xml.contains("<lastmod>2024-05-02</lastmod>"));
        assert_eq!(xml.matches("<priority>").count(), 6);
    }

    #[test]
    fn test_single_page_site_has_no_pagination_entries() {
        let site_root = Url::parse("https://example.org/").unwrap();
        let index_url = Url::parse("https://example.org/pages/").unwrap();
        let config = SitemapConfig {
            site_root: &site_root,
            index_url: &index_url,
            total_index_pages: 1,
        };
        let xml = sitemap(&config, &[], &[]);
        assert!(!xml.contains("1.html"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }
}
