use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// The shape of a `config.toml` project file.
#[derive(Deserialize)]
struct ProjectFile {
    title: String,
    base_url: Url,

    #[serde(default = "default_template")]
    default_template: String,
}

fn default_template() -> String {
    String::from("page.html")
}

/// Site-wide configuration made available to every template as `config`. Read
/// once at build start and never mutated during rendering.
#[derive(Clone, Debug, Serialize)]
pub struct SiteConfig {
    /// The site title, rendered in the header and the document title.
    pub title: String,

    /// The base URL under which every page is published. Always ends in a
    /// trailing slash so that [`Url::join`] treats it as a directory.
    pub base_url: Url,
}

/// Resolved build configuration: the site configuration plus every directory
/// the build reads from or writes to.
pub struct Config {
    pub site: SiteConfig,
    pub content_directory: PathBuf,
    pub templates_glob: String,
    pub static_directory: PathBuf,
    pub output_directory: PathBuf,
    pub default_template: String,
}

impl Config {
    /// Looks for a `config.toml` in `dir` or any of its parent directories
    /// and loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join("config.toml");
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `config.toml` in any parent directory"
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: ProjectFile = toml::from_str(&contents)
            .with_context(|| format!("Parsing project file `{}`", path.display()))?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                // Per the `Url::join` docs, a trailing slash is significant:
                // without it the last path component is treated as a "file"
                // name and replaced on join. Normalize here so the rest of
                // the crate can join page file names directly.
                let mut base_url = project.base_url;
                if !base_url.path().ends_with('/') {
                    base_url.set_path(&format!("{}/", base_url.path()));
                }
                Ok(Config {
                    site: SiteConfig {
                        title: project.title,
                        base_url,
                    },
                    content_directory: project_root.join("content"),
                    templates_glob: project_root
                        .join("templates")
                        .join("**")
                        .join("*.html")
                        .to_string_lossy()
                        .into_owned(),
                    static_directory: project_root.join("static"),
                    output_directory: output_directory.to_owned(),
                    default_template: project.default_template,
                })
            }
        }
    }
}
