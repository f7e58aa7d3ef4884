use crate::config::CrawlerConfig;
use url::Url;

/// Decides whether a resolved link points at an on-site content page
///
/// A link is accepted when it shares the host of the page it was found on,
/// its path starts with the content prefix, and it starts with none of the
/// excluded (namespace, help, file, template, talk) prefixes.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    content_prefix: String,
    excluded_prefixes: Vec<String>,
}

impl LinkFilter {
    pub fn new(content_prefix: impl Into<String>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            content_prefix: content_prefix.into(),
            excluded_prefixes,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.content_prefix.clone(),
            config.excluded_prefixes.clone(),
        )
    }

    /// Returns true if `link` is a content page on the same site as `page`
    pub fn accepts(&self, page: &Url, link: &Url) -> bool {
        if link.scheme() != "http" && link.scheme() != "https" {
            return false;
        }

        if link.host_str() != page.host_str()
            || link.port_or_known_default() != page.port_or_known_default()
        {
            return false;
        }

        let path = link.path();
        path.starts_with(&self.content_prefix)
            && !self
                .excluded_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki_filter() -> LinkFilter {
        LinkFilter::new(
            "/wiki/",
            vec!["/wiki/Help".to_string(), "/wiki/Talk".to_string()],
        )
    }

    fn page() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Cat").unwrap()
    }

    #[test]
    fn test_accepts_content_link() {
        let link = Url::parse("https://en.wikipedia.org/wiki/Felidae").unwrap();
        assert!(wiki_filter().accepts(&page(), &link));
    }

    #[test]
    fn test_rejects_excluded_prefix() {
        let link = Url::parse("https://en.wikipedia.org/wiki/Help:Contents").unwrap();
        assert!(!wiki_filter().accepts(&page(), &link));

        let link = Url::parse("https://en.wikipedia.org/wiki/Talk:Cat").unwrap();
        assert!(!wiki_filter().accepts(&page(), &link));
    }

    #[test]
    fn test_rejects_non_content_path() {
        let link = Url::parse("https://en.wikipedia.org/w/index.php?title=Cat").unwrap();
        assert!(!wiki_filter().accepts(&page(), &link));
    }

    #[test]
    fn test_rejects_other_host() {
        let link = Url::parse("https://de.wikipedia.org/wiki/Katze").unwrap();
        assert!(!wiki_filter().accepts(&page(), &link));
    }

    #[test]
    fn test_rejects_other_port() {
        let page = Url::parse("http://127.0.0.1:8080/wiki/Cat").unwrap();
        let link = Url::parse("http://127.0.0.1:9090/wiki/Dog").unwrap();
        assert!(!wiki_filter().accepts(&page, &link));
    }
}
