//! The page renderer: binds a [`Page`] and the [`SiteConfig`] to a Tera
//! template and produces the final HTML document. Rendering is a single-pass,
//! stateless transformation: no I/O, no mutation of inputs, and rendering the
//! same page twice yields byte-identical output.

use crate::config::SiteConfig;
use crate::page::Page;
use chrono::NaiveDate;
use std::fmt;
use tera::{Context, Tera};

/// The number of characters of the page description exposed to the HTML meta
/// description tag.
const META_DESCRIPTION_LIMIT: usize = 150;

/// Renders [`Page`]s to HTML documents. Owns the compiled template set and
/// the site configuration; both are loaded once at build start.
pub struct Renderer {
    tera: Tera,
    site: SiteConfig,
    default_template: String,
}

impl Renderer {
    /// Compiles every template matching `templates_glob` into a new
    /// [`Renderer`]. `default_template` is used for pages whose frontmatter
    /// requests no template of its own.
    pub fn new(
        templates_glob: &str,
        site: SiteConfig,
        default_template: String,
    ) -> Result<Renderer> {
        Ok(Renderer {
            tera: Tera::new(templates_glob)?,
            site,
            default_template,
        })
    }

    /// Renders a single [`Page`] to a complete HTML document. The template is
    /// the one the page's frontmatter requested, else the configured default;
    /// the renderer adds no decision logic beyond variable substitution and
    /// the templates' own conditional blocks. Alongside `page` and `config`,
    /// the context carries two precomputed values: `meta_description` (the
    /// description truncated to its first 150 characters, empty when absent)
    /// and `published` (the date as `Month Day, Year`, null when absent).
    pub fn render(&self, page: &Page) -> Result<String> {
        let mut context = Context::new();
        context.insert("config", &self.site);
        context.insert("page", page);
        context.insert(
            "meta_description",
            &meta_description(page.description.as_deref()),
        );
        context.insert("published", &page.date.map(published));
        Ok(self.tera.render(self.template_for(page), &context)?)
    }

    fn template_for<'a>(&'a self, page: &'a Page) -> &'a str {
        page.template.as_deref().unwrap_or(&self.default_template)
    }
}

/// The first [`META_DESCRIPTION_LIMIT`] characters of the description, or
/// the empty string when there is none.
fn meta_description(description: Option<&str>) -> String {
    match description {
        None => String::new(),
        Some(description) => description.chars().take(META_DESCRIPTION_LIMIT).collect(),
    }
}

/// Formats a page date for the "Published" line, e.g. `2022-12-22` renders
/// as `December 22, 2022`.
fn published(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a rendering operation.
#[derive(Debug)]
pub enum Error {
    /// An error compiling templates or rendering a page through one.
    Template(tera::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
        }
    }
}

impl From<tera::Error> for Error {
    /// Converts a [`tera::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible template operations.
    fn from(err: tera::Error) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::page::Extra;
    use crate::toc::HeadingNode;
    use std::path::PathBuf;
    use url::Url;

    fn renderer() -> Renderer {
        Renderer::new(
            "templates/**/*.html",
            SiteConfig {
                title: String::from("Test Site"),
                base_url: Url::parse("https://example.org/").unwrap(),
            },
            String::from("page.html"),
        )
        .unwrap()
    }

    fn page(title: &str) -> Page {
        Page {
            title: title.to_owned(),
            description: None,
            date: None,
            updated: None,
            slug: String::from("test"),
            tags: Vec::new(),
            extra: Extra::default(),
            toc: Vec::new(),
            content: String::new(),
            url: Url::parse("https://example.org/test.html").unwrap(),
            template: None,
            file_path: PathBuf::from("/tmp/scop-out/test.html"),
        }
    }

    fn node(title: &str, anchor: &str, children: Vec<HeadingNode>) -> HeadingNode {
        HeadingNode {
            title: title.to_owned(),
            permalink: format!("https://example.org/test.html#{}", anchor),
            children,
        }
    }

    #[test]
    fn test_minimal_page() -> Result<()> {
        // Page{title="Test", date=None, extra={}}: the output carries the
        // title as an <h1> and has neither a "Published" line nor a table of
        // contents.
        let html = renderer().render(&page("Test"))?;
        assert!(html.contains("<h1>Test</h1>"));
        assert!(!html.contains("Published"));
        assert!(!html.contains(r#"<nav class="toc">"#));
        Ok(())
    }

    #[test]
    fn test_published_line() -> Result<()> {
        let mut p = page("Test");
        p.date = NaiveDate::from_ymd_opt(2022, 12, 22);
        let html = renderer().render(&p)?;
        assert!(html.contains("Published: December 22, 2022"));
        Ok(())
    }

    #[test]
    fn test_published_line_single_digit_day() -> Result<()> {
        let mut p = page("Test");
        p.date = NaiveDate::from_ymd_opt(2021, 4, 6);
        let html = renderer().render(&p)?;
        assert!(html.contains("Published: April 6, 2021"));
        Ok(())
    }

    #[test]
    fn test_updated_raw_value() -> Result<()> {
        let mut p = page("Test");
        p.updated = Some(String::from("2023-01-05"));
        let html = renderer().render(&p)?;
        assert!(html.contains("Updated: 2023-01-05"));
        Ok(())
    }

    #[test]
    fn test_meta_description_truncated() -> Result<()> {
        let mut p = page("T");
        p.description = Some("x".repeat(200));
        let html = renderer().render(&p)?;
        assert!(html.contains(&format!(
            r#"<meta name="description" content="{}">"#,
            "x".repeat(150)
        )));
        assert!(!html.contains(&"x".repeat(151)));
        Ok(())
    }

    #[test]
    fn test_meta_description_absent() -> Result<()> {
        let html = renderer().render(&page("Test"))?;
        assert!(html.contains(r#"<meta name="description" content="">"#));
        Ok(())
    }

    #[test]
    fn test_toc_omitted_without_flag() -> Result<()> {
        let mut p = page("Test");
        p.toc = vec![node("Intro", "intro", Vec::new())];
        let html = renderer().render(&p)?;
        assert!(!html.contains(r#"<nav class="toc">"#));
        Ok(())
    }

    #[test]
    fn test_toc_rendered_with_flag() -> Result<()> {
        let mut p = page("Test");
        p.extra.show_toc = true;
        p.toc = vec![
            node(
                "Intro",
                "intro",
                vec![node("Background", "background", Vec::new())],
            ),
            node("Design", "design", Vec::new()),
        ];
        let html = renderer().render(&p)?;
        assert!(html.contains(r#"<nav class="toc">"#));
        // Three entries total; a nested list appears only under the entry
        // that has children (one nested <ul> plus the outer one).
        assert_eq!(html.matches("<li>").count(), 3);
        assert_eq!(html.matches("<ul>").count(), 2);
        assert!(html.contains(r##"href="https://example.org/test.html#intro""##));
        assert!(html.contains(r##"href="https://example.org/test.html#background""##));
        assert!(html.contains(r##"href="https://example.org/test.html#design""##));
        Ok(())
    }

    #[test]
    fn test_article_template_always_renders_toc() -> Result<()> {
        let mut p = page("Test");
        p.template = Some(String::from("article.html"));
        p.toc = vec![node("Intro", "intro", Vec::new())];
        // show_toc deliberately left unset.
        let html = renderer().render(&p)?;
        assert!(html.contains(r#"<nav class="toc">"#));
        Ok(())
    }

    #[test]
    fn test_katex_markup_behind_flag() -> Result<()> {
        let mut p = page("Test");
        assert!(!renderer().render(&p)?.contains("katex"));
        p.extra.katex = true;
        assert!(renderer().render(&p)?.contains("katex"));
        Ok(())
    }

    #[test]
    fn test_rendering_is_idempotent() -> Result<()> {
        let mut p = page("Test");
        p.date = NaiveDate::from_ymd_opt(2022, 12, 22);
        p.description = Some(String::from("A page."));
        p.extra.show_toc = true;
        p.toc = vec![node("Intro", "intro", Vec::new())];
        let renderer = renderer();
        assert_eq!(renderer.render(&p)?, renderer.render(&p)?);
        Ok(())
    }

    #[test]
    fn test_site_title_in_header() -> Result<()> {
        let html = renderer().render(&page("Test"))?;
        assert!(html.contains("Test Site"));
        Ok(())
    }

    #[test]
    fn test_meta_description_char_boundary() {
        // Multi-byte characters count as single characters, not bytes.
        let description: String = "é".repeat(200);
        assert_eq!(meta_description(Some(&description)).chars().count(), 150);
    }
}
