//! Support for creating the RSS 2.0 feed from a list of posts.

use crate::post::Post;
use crate::util::xml_escape;
use chrono::{NaiveTime, TimeZone, Utc};
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    /// The channel title, usually the site title.
    pub title: String,

    /// The channel description.
    pub description: String,

    /// The site's home page URL.
    pub home_page: Url,

    /// The feed's own URL, advertised as the channel's self link.
    pub feed_url: Url,

    /// The number of most-recent posts included in the feed.
    pub length: usize,
}

/// Creates an RSS 2.0 feed from some configuration ([`FeedConfig`]) and a
/// list of [`Post`]s (assumed most-recent-first) and writes the result to a
/// [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Post], mut w: W) -> Result<()> {
    w.write_all(feed(config, posts).as_bytes())
}

fn feed(config: &FeedConfig, posts: &[Post]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str("  <channel>\n");
    xml.push_str(&format!(
        "    <title>{}</title>\n",
        xml_escape(&config.title)
    ));
    xml.push_str(&format!("    <link>{}</link>\n", config.home_page));
    xml.push_str(&format!(
        "    <description>{}</description>\n",
        xml_escape(&config.description)
    ));
    xml.push_str("    <language>en-us</language>\n");
    xml.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        Utc::now().to_rfc2822()
    ));
    xml.push_str(&format!(
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        config.feed_url
    ));
    for post in posts.iter().take(config.length) {
        xml.push_str(&item(post));
    }
    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");
    xml
}

fn item(post: &Post) -> String {
    // Posts carry a calendar date only; the feed timestamps them at
    // midnight UTC.
    let midnight = post.date.and_time(NaiveTime::from_hms(0, 0, 0));
    let pub_date = Utc.from_utc_datetime(&midnight).to_rfc2822();

    let mut xml = String::from("    <item>\n");
    xml.push_str(&format!(
        "      <title><![CDATA[{}]]></title>\n",
        cdata(&post.title)
    ));
    xml.push_str(&format!("      <link>{}</link>\n", post.url));
    xml.push_str(&format!(
        "      <guid isPermaLink=\"true\">{}</guid>\n",
        post.url
    ));
    xml.push_str(&format!(
        "      <description><![CDATA[{}]]></description>\n",
        cdata(&post.description)
    ));
    xml.push_str(&format!("      <pubDate>{}</pubDate>\n", pub_date));
    for tag in &post.tags {
        xml.push_str(&format!(
            "      <category>{}</category>\n",
            xml_escape(&tag.display)
        ));
    }
    xml.push_str("    </item>\n");
    xml
}

// A literal `]]>` inside a CDATA section would terminate it early.
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]&gt;")
}

type Result<T> = std::result::Result<T, std::io::Error>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::sample;
    use crate::tag::Tag;

    fn config() -> FeedConfig {
        FeedConfig {
            title: "example & co".to_owned(),
            description: "Personal tech articles".to_owned(),
            home_page: Url::parse("https://example.org/").unwrap(),
            feed_url: Url::parse("https://example.org/rss.xml").unwrap(),
            length: 50,
        }
    }

    #[test]
    fn test_feed_structure() {
        let tags_url = Url::parse("https://example.org/pages/").unwrap();
        let mut post = sample("hello-world", "Hello, world!", "2024-05-02");
        post.tags = vec![Tag::new("Greetings", &tags_url).unwrap()];

        let xml = feed(&config(), &[post]);
        assert!(xml.contains("<title>example &amp; co</title>"));
        assert!(xml.contains("<atom:link href=\"https://example.org/rss.xml\""));
        assert!(xml.contains("<title><![CDATA[Hello, world!]]></title>"));
        assert!(xml.contains(
            "<guid isPermaLink=\"true\">https://example.org/posts/hello-world.html</guid>"
        ));
        assert!(xml.contains("<pubDate>Thu, 02 May 2024 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("<category>Greetings</category>"));
    }

    #[test]
    fn test_feed_caps_item_count() {
        let posts: Vec<_> = (0..60)
            .map(|i| sample(&format!("post-{:02}", i), &format!("Post {:02}", i), "2024-01-01"))
            .collect();
        let xml = feed(&config(), &posts);
        assert_eq!(xml.matches("<item>").count(), 50);
    }

    #[test]
    fn test_cdata_cannot_be_terminated_early() {
        assert_eq!(cdata("a ]]> b"), "a ]]&gt; b");
    }
}
