//! Builds a page's table of contents from the headings collected while
//! rendering its body ([`crate::markdown`]).

use serde::Serialize;
use url::Url;

/// One entry in a page's table of contents. `children` holds the entry's
/// strictly-nested subheadings in document order; the table of contents
/// models exactly two levels, so children never have children of their own.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeadingNode {
    pub title: String,

    /// The page URL plus the heading's anchor fragment.
    pub permalink: String,

    pub children: Vec<HeadingNode>,
}

/// A heading collected from a page body: its level (1-6), its plain-text
/// title, and the anchor id emitted on the corresponding HTML tag.
#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub anchor: String,
}

/// Builds the two-level table of contents for a page. The smallest heading
/// level present in the body becomes the top level; headings exactly one
/// level deeper nest under the most recent top-level entry; anything deeper
/// is not modeled. A subheading appearing before any top-level heading is
/// promoted to the top level rather than dropped. Ordering reflects document
/// order throughout.
pub fn build_toc(headings: &[Heading], page_url: &Url) -> Vec<HeadingNode> {
    let top = match headings.iter().map(|h| h.level).min() {
        None => return Vec::new(),
        Some(level) => level,
    };

    let mut toc: Vec<HeadingNode> = Vec::new();
    for heading in headings {
        let node = HeadingNode {
            title: heading.title.clone(),
            permalink: format!("{}#{}", page_url, heading.anchor),
            children: Vec::new(),
        };
        if heading.level == top {
            toc.push(node);
        } else if heading.level == top + 1 {
            match toc.last_mut() {
                Some(parent) => parent.children.push(node),
                None => toc.push(node),
            }
        }
    }
    toc
}
