//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: parsing the pages
//! ([`crate::page`]), rendering each one through its template
//! ([`crate::render`]), writing the results to the output directory, and
//! copying the static source directory into the output directory.

use crate::config::Config;
use crate::page::{Error as ParseError, Page, Parser as PageParser};
use crate::render::{Error as RenderError, Renderer};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Builds the site from a [`Config`] object. This calls into
/// [`PageParser::parse_page`] and [`Renderer::render`] which do the
/// heavy-lifting; each page is parsed, rendered, and written independently of
/// every other page.
pub fn build_site(config: &Config) -> Result<()> {
    let parser = PageParser::new(&config.site.base_url, &config.output_directory);
    let pages = parse_pages(&parser, &config.content_directory)?;
    info!("parsed {} pages", pages.len());

    let renderer = Renderer::new(
        &config.templates_glob,
        config.site.clone(),
        config.default_template.clone(),
    )?;

    // Blow away the old output directory so we don't have any collisions
    // with files from a previous build.
    rmdir(&config.output_directory)?;
    fs::create_dir_all(&config.output_directory)?;

    for page in &pages {
        let html = renderer.render(page)?;
        fs::write(&page.file_path, html)?;
        debug!("wrote `{}`", page.file_path.display());
    }

    // copy static directory
    copy_dir(&config.static_directory, &config.output_directory)?;

    Ok(())
}

/// Walks the content directory and parses every Markdown file found into a
/// [`Page`].
fn parse_pages(parser: &PageParser, content_directory: &Path) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    for result in WalkDir::new(content_directory) {
        let entry = result?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map_or(false, |extension| extension == MARKDOWN_EXTENSION)
        {
            // strip_prefix() should never fail since every entry is under
            // the walk root.
            let relative_path = entry.path().strip_prefix(content_directory).unwrap();
            pages.push(parser.parse_page(content_directory, relative_path)?);
        }
    }
    Ok(pages)
}

/// Recursively copies the contents of `src` into `dst`. A missing `src` is
/// tolerated: sites without static assets are fine.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    let entries = match fs::read_dir(src) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        other => other?,
    };
    fs::create_dir_all(dst)?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
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

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// rendering, cleaning the output directory, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors rendering [`Page`]s through their templates.
    Render(RenderError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while walking the content directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SiteConfig;
    use url::Url;

    fn test_config(output_directory: PathBuf) -> Config {
        Config {
            site: SiteConfig {
                title: String::from("Test Site"),
                base_url: Url::parse("https://example.org/").unwrap(),
            },
            content_directory: PathBuf::from("./testdata/content"),
            templates_glob: String::from("templates/**/*.html"),
            static_directory: PathBuf::from("./testdata/static"),
            output_directory,
            default_template: String::from("page.html"),
        }
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let output = std::env::temp_dir().join("scop-build-site-test");
        let _ = fs::remove_dir_all(&output);
        build_site(&test_config(output.clone()))?;

        // One HTML file per content file, named by slug.
        assert!(output.join("simple.html").is_file());
        assert!(output.join("hash-tables.html").is_file());

        let simple = fs::read_to_string(output.join("simple.html"))?;
        assert!(simple.contains("<h1>Simple</h1>"));
        assert!(simple.contains("Published: December 22, 2022"));

        let article = fs::read_to_string(output.join("hash-tables.html"))?;
        assert!(article.contains(r#"<nav class="toc">"#));
        assert!(article.contains(r##"href="https://example.org/hash-tables.html#open-addressing""##));
        assert!(article.contains(r#"<li class="tag">algorithms</li>"#));

        // Static assets are copied verbatim.
        assert!(output.join("style.css").is_file());
        Ok(())
    }

    #[test]
    fn test_build_site_is_deterministic() -> Result<()> {
        let output = std::env::temp_dir().join("scop-build-determinism-test");
        let _ = fs::remove_dir_all(&output);
        let config = test_config(output.clone());
        build_site(&config)?;
        let first = fs::read_to_string(output.join("simple.html"))?;
        build_site(&config)?;
        let second = fs::read_to_string(output.join("simple.html"))?;
        assert_eq!(first, second);
        Ok(())
    }
}
