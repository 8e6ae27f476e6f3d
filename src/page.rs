//! Defines the [`Page`] type and the logic for parsing pages from content
//! source files. A source file is Markdown with a leading TOML frontmatter
//! block delimited by `+++` lines:
//!
//! ```md
//! +++
//! title = "Hello, world!"
//! date = 2021-04-16
//!
//! [taxonomies]
//! tags = ["greet"]
//!
//! [extra]
//! show_toc = true
//! +++
//! ## Hello
//!
//! World
//! ```
//!
//! `title` is the only required field; everything else degrades to omission.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::markdown;
use crate::toc::{self, HeadingNode};

/// One renderable document. Constructed once per build from a content source
/// file and immutable thereafter.
#[derive(Debug, Serialize)]
pub struct Page {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,

    /// The frontmatter `updated` value, carried through verbatim.
    pub updated: Option<String>,

    /// The slugified source file stem; determines the page's URL and output
    /// file name.
    pub slug: String,

    pub tags: Vec<String>,
    pub extra: Extra,

    /// The page's table of contents, in document order.
    pub toc: Vec<HeadingNode>,

    /// The body, pre-rendered to HTML.
    pub content: String,

    /// The published URL for the page.
    pub url: Url,

    /// The template requested for this page by its frontmatter, if any.
    #[serde(skip)]
    pub template: Option<String>,

    /// Where the rendered HTML will be written.
    #[serde(skip)]
    pub file_path: PathBuf,
}

/// Open mapping of per-page flags from the `[extra]` frontmatter table. The
/// `katex` and `show_toc` flags are recognized by the shipped templates; any
/// other key is carried through for custom templates to consume.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Extra {
    #[serde(default)]
    pub katex: bool,

    #[serde(default)]
    pub show_toc: bool,

    #[serde(flatten)]
    pub rest: toml::value::Table,
}

#[derive(Deserialize)]
struct Frontmatter {
    title: String,
    description: Option<String>,
    date: Option<toml::value::Datetime>,
    updated: Option<toml::value::Datetime>,
    template: Option<String>,

    #[serde(default)]
    taxonomies: Taxonomies,

    #[serde(default)]
    extra: Extra,
}

#[derive(Default, Deserialize)]
struct Taxonomies {
    #[serde(default)]
    tags: Vec<String>,
}

/// Parses [`Page`] objects from content source files.
pub struct Parser<'a> {
    /// The base URL under which pages are published (i.e., the URL for a page
    /// is `{base_url}{slug}.html`). Must end in a trailing slash.
    base_url: &'a Url,

    /// The directory in which rendered pages will be written.
    output_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(base_url: &'a Url, output_directory: &'a Path) -> Parser<'a> {
        Parser {
            base_url,
            output_directory,
        }
    }

    /// Parses a single [`Page`] from the file at
    /// `{source_directory}/{relative_path}`. Errors are annotated with the
    /// offending path.
    pub fn parse_page(&self, source_directory: &Path, relative_path: &Path) -> Result<Page> {
        match self._parse_page(source_directory, relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing page `{:?}`", relative_path),
                Box::new(e),
            )),
        }
    }

    fn _parse_page(&self, source_directory: &Path, relative_path: &Path) -> Result<Page> {
        let contents = std::fs::read_to_string(source_directory.join(relative_path))?;
        self.parse_str(relative_path, &contents)
    }

    /// Parses a single [`Page`] from the contents of a source file.
    /// `relative_path` is the path of the file relative to the content
    /// directory; it determines the page's slug and is the base against
    /// which relative links in the body are resolved.
    pub fn parse_str(&self, relative_path: &Path, input: &str) -> Result<Page> {
        let (toml_start, toml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = toml::from_str(&input[toml_start..toml_stop])?;

        let stem = relative_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?;
        let slug = slug::slugify(stem);
        let file_name = format!("{}.html", slug);
        let url = self.base_url.join(&file_name)?;

        let (content, headings) = markdown::to_html(
            self.base_url,
            &relative_path.to_string_lossy(),
            &input[body_start..],
        )?;
        let toc = toc::build_toc(&headings, &url);

        Ok(Page {
            title: frontmatter.title,
            description: frontmatter.description,
            date: frontmatter.date.as_ref().map(date_of).transpose()?,
            updated: frontmatter.updated.map(|d| d.to_string()),
            slug,
            tags: frontmatter.taxonomies.tags,
            extra: frontmatter.extra,
            toc,
            content,
            url,
            template: frontmatter.template,
            file_path: self.output_directory.join(&file_name),
        })
    }
}

/// Locates the frontmatter fences in a source file, returning the start and
/// end offsets of the TOML block and the offset at which the body begins.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "+++";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                        // toml_start
            FENCE.len() + offset,               // toml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )),
    }
}

/// Converts a TOML datetime from the frontmatter into a [`NaiveDate`]. Time
/// and offset components, if present, are ignored.
fn date_of(datetime: &toml::value::Datetime) -> Result<NaiveDate> {
    let date = datetime
        .date
        .ok_or_else(|| Error::InvalidDate(datetime.to_string()))?;
    NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)
        .ok_or_else(|| Error::InvalidDate(datetime.to_string()))
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`Page`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Page`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page source file is missing its starting frontmatter
    /// fence (`+++`).
    FrontmatterMissingStartFence,

    /// Returned when a page source file is missing its terminal frontmatter
    /// fence (`+++` i.e., the starting fence was found but the ending one
    /// was missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as TOML.
    /// This includes a missing `title`, the only required field.
    DeserializeToml(toml::de::Error),

    /// Returned when a frontmatter date has no date component or an
    /// out-of-range one.
    InvalidDate(String),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned when a source file isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Page must begin with `+++`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `+++`")
            }
            Error::DeserializeToml(err) => err.fmt(f),
            Error::InvalidDate(date) => write!(f, "Invalid date: {}", date),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
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
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeToml(err) => Some(err),
            Error::InvalidDate(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        match err {
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

impl From<toml::de::Error> for Error {
    /// Converts a [`toml::de::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for frontmatter deserialization.
    fn from(err: toml::de::Error) -> Error {
        Error::DeserializeToml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
