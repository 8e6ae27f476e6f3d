//! The library code for the `scop` static site generator. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Parsing pages from content source files ([`crate::page`])
//! 2. Rendering the pages through templates and writing the output files
//!    ([`crate::render`] and [`crate::build`])
//!
//! A content source file is a Markdown document with a leading TOML
//! frontmatter block delimited by `+++` lines. Parsing a source file produces
//! an immutable [`crate::page::Page`]: the frontmatter fields, the Markdown
//! body rendered to HTML ([`crate::markdown`]), and a two-level table of
//! contents collected from the body's headings ([`crate::toc`]).
//!
//! Rendering binds a page and the site configuration ([`crate::config`]) to a
//! Tera template--an article template for long-form posts, a generic page
//! template otherwise--and produces the final HTML document. Pages have no
//! data dependencies on one another, so the build is a single pass over the
//! content directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod markdown;
pub mod page;
pub mod render;
pub mod toc;
pub mod url;
