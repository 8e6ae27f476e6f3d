//! Renders a page body from Markdown to HTML and collects its headings along
//! the way. Rendering makes two passes over the Markdown event stream: the
//! first gathers every heading (level, plain-text title, anchor id) so that
//! anchors are known up front; the second converts intra-site links
//! ([`crate::url::Converter`]) and rewrites heading tags to carry their
//! anchor ids, then hands the events to [`pulldown_cmark::html::push_html`].

use crate::toc::Heading;
use crate::url::Converter as LinkConverter;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use url::{ParseError as UrlParseError, Url};

/// Converts a page body from Markdown to HTML. Returns the rendered HTML and
/// the headings found in the body, in document order.
///
/// * `pages_url` is the prefix under which pages are published (e.g.,
///   `https://example.org/`). This should end in a trailing slash.
/// * `source_path` is the relative path to the source file from the content
///   directory; relative links in the body are resolved against it.
/// * `markdown` is the body of the source file, frontmatter excluded.
pub fn to_html(
    pages_url: &Url,
    source_path: &str,
    markdown: &str,
) -> Result<(String, Vec<Heading>), Error> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let headings = collect_headings(Parser::new_ext(markdown, options));

    let mut converter = EventConverter {
        link_converter: LinkConverter::new(pages_url, source_path)?,
        anchors: headings.iter().map(|h| h.anchor.clone()).collect(),
    };
    let mut events = Vec::new();
    for ev in Parser::new_ext(markdown, options) {
        events.push(converter.convert(ev)?);
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    Ok((out, headings))
}

/// Gathers every heading in the event stream. A heading's title is the
/// concatenation of the text and inline-code events between its start and
/// end tags (i.e., inline formatting is stripped). Anchor ids are slugified
/// titles; a repeated title gets a numeric suffix (`-1`, `-2`, ...) so ids
/// stay unique within the page.
fn collect_headings<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(u32, String)> = None;

    for ev in events {
        match ev {
            Event::Start(Tag::Heading(level)) => {
                current = Some((level, String::new()));
            }
            Event::End(Tag::Heading(_)) => {
                if let Some((level, title)) = current.take() {
                    let base = slug::slugify(&title);
                    let anchor = match seen.get(&base) {
                        None => base.clone(),
                        Some(n) => format!("{}-{}", base, n),
                    };
                    *seen.entry(base).or_insert(0) += 1;
                    headings.push(Heading {
                        level,
                        title,
                        anchor,
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, title)) = current.as_mut() {
                    title.push_str(&text);
                }
            }
            _ => {}
        }
    }
    headings
}

struct EventConverter<'a> {
    link_converter: LinkConverter<'a>,

    /// Anchor ids for the page's headings, in document order. Popped as
    /// heading start tags are encountered.
    anchors: VecDeque<String>,
}

impl<'a> EventConverter<'a> {
    fn convert<'b>(&mut self, ev: Event<'b>) -> Result<Event<'b>, Error> {
        Ok(match ev {
            // Heading tags are replaced with raw HTML carrying the anchor id
            // collected in the first pass. Anchors are slugified and thus
            // need no escaping.
            Event::Start(Tag::Heading(level)) => Event::Html(CowStr::Boxed(
                match self.anchors.pop_front() {
                    Some(anchor) => {
                        format!(r#"<h{} id="{}">"#, level, anchor)
                    }
                    None => format!("<h{}>", level),
                }
                .into_boxed_str(),
            )),
            Event::End(Tag::Heading(level)) => Event::Html(CowStr::Boxed(
                format!("</h{}>\n", level).into_boxed_str(),
            )),
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            _ => ev,
        })
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, Error> {
        Ok(match tag {
            // Internal links (links from one page's body *to* another page)
            // need to be converted from their source form to their published
            // form (e.g., a link to `foo.md` becomes a link to `foo.html`).
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
                CowStr::Boxed(self.link_converter.convert(&url)?.into_boxed_str()),
                title,
            ),
            _ => tag,
        })
    }
}

/// Represents an error converting Markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a problem parsing URLs.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
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

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> (String, Vec<Heading>) {
        to_html(
            &Url::parse("https://example.org/").unwrap(),
            "test.md",
            markdown,
        )
        .unwrap()
    }

    #[test]
    fn test_heading_anchors() {
        let (html, headings) = render("## Hello, World\n\nbody\n");
        assert!(html.contains(r#"<h2 id="hello-world">"#));
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].level, 2);
        assert_eq!(headings[0].title, "Hello, World");
        assert_eq!(headings[0].anchor, "hello-world");
    }

    #[test]
    fn test_duplicate_headings_get_unique_anchors() {
        let (html, headings) = render("## Setup\n\n## Setup\n\n## Setup\n");
        assert_eq!(headings[0].anchor, "setup");
        assert_eq!(headings[1].anchor, "setup-1");
        assert_eq!(headings[2].anchor, "setup-2");
        assert!(html.contains(r#"<h2 id="setup-2">"#));
    }

    #[test]
    fn test_heading_title_strips_inline_formatting() {
        let (_, headings) = render("## The `parse` function\n");
        assert_eq!(headings[0].title, "The parse function");
    }

    #[test]
    fn test_internal_link_converted() {
        let (html, _) = render("[other](other.md)\n");
        assert!(html.contains(r#"href="https://example.org/other.html""#));
    }

    #[test]
    fn test_remote_link_untouched() {
        let (html, _) = render("[remote](https://remote.org/doc.md)\n");
        assert!(html.contains(r#"href="https://remote.org/doc.md""#));
    }

    #[test]
    fn test_plain_paragraph() {
        let (html, headings) = render("Just a paragraph.\n");
        assert!(html.contains("<p>Just a paragraph.</p>"));
        assert!(headings.is_empty());
    }
}
