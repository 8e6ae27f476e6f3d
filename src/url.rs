//! Converts intra-site links found in page bodies from their source form
//! (`other-page.md`) to their published form (`other-page.html`). Links to
//! assets and links to other sites pass through untouched.

use url::{ParseError, Url};

const MARKDOWN_EXTENSION: &str = ".md";
const HTML_EXTENSION: &str = ".html";

pub struct Converter<'a> {
    pages_root: &'a Url,
    base: Url,
}

impl<'a> Converter<'a> {
    /// Constructs a new `Converter`
    ///
    /// # Arguments
    ///
    /// * `pages_root` - the URL prefix under which pages are published.
    /// * `base` - the relative path from `pages_root` from which target URLs
    ///   will be converted.
    pub fn new(pages_root: &'a Url, base: &str) -> Result<Converter<'a>> {
        Ok(Converter {
            pages_root,
            base: pages_root.join(base)?,
        })
    }

    fn convert_absolute(&self, absolute: Url) -> Result<Url> {
        if let Some(relative) = self.pages_root.make_relative(&absolute) {
            if !relative.starts_with("../") && relative.ends_with(MARKDOWN_EXTENSION) {
                return Ok(self
                    .pages_root
                    .join(&format!(
                        "{}{}",
                        relative.trim_end_matches(MARKDOWN_EXTENSION),
                        HTML_EXTENSION,
                    ))
                    .unwrap()); // should always succeed
            }
        }
        Ok(absolute)
    }

    fn convert_unknown(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => self.convert_absolute(absolute),
            Err(ParseError::RelativeUrlWithoutBase) => {
                self.convert_absolute(self.base.join(url)?)
            }
            Err(e) => Err(e),
        }
    }

    pub fn convert(&self, url: &str) -> Result<String> {
        Ok(self.convert_unknown(url)?.to_string())
    }
}

type Result<T> = std::result::Result<T, ParseError>;
