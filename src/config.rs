use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

use crate::release::RELEASE_MARKER;

/// A valid config, loaded from `docket.toml` or filled in with defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) github: GitHub,
    pub(crate) notes: Notes,
    pub(crate) ims: Ims,
    pub(crate) document: Document,
    /// Only needed by the email channel, which has no sensible defaults.
    pub(crate) email: Option<Email>,
}

impl Config {
    const CONFIG_PATH: &'static str = "docket.toml";

    /// Load the config at `path`, or `docket.toml` in the working directory if no path was given.
    ///
    /// ## Errors
    /// 1. An explicitly requested file can't be read
    /// 2. The file contents are not a valid config
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, Error> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(Self::CONFIG_PATH), false),
        };
        let source_code = match fs::read_to_string(&path) {
            Ok(source_code) => source_code,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                log::debug!("No `{}` found, using default config", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(Error::Read { path, source }),
        };
        Self::parse(&path.display().to_string(), source_code)
    }

    fn parse(name: &str, source_code: String) -> Result<Self, Error> {
        let config: Self = match toml::from_str(&source_code) {
            Ok(config) => config,
            Err(err) => {
                return Err(Error::Toml {
                    message: err.message().to_string(),
                    span: err.span().map(SourceSpan::from),
                    source_code: NamedSource::new(name, source_code),
                })
            }
        };
        if config.notes.marker.is_empty() {
            return Err(Error::EmptyMarker {
                path: name.to_string(),
            });
        }
        Ok(config)
    }
}

/// Details needed to talk to GitHub.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GitHub {
    /// Point this at a GitHub Enterprise Server API, like `https://github.example.com/api/v3`.
    pub(crate) api_url: String,
}

impl Default for GitHub {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
        }
    }
}

/// How release notes are found in a pull request description.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Notes {
    /// Everything after the last occurrence of this line is the release notes.
    pub(crate) marker: String,
    /// Used when a description has no marker.
    pub(crate) default: String,
}

impl Default for Notes {
    fn default() -> Self {
        Self {
            marker: RELEASE_MARKER.to_string(),
            default: String::new(),
        }
    }
}

/// The Adobe IMS token endpoint used for the document source.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Ims {
    pub(crate) endpoint: String,
    pub(crate) scopes: String,
}

impl Default for Ims {
    fn default() -> Self {
        Self {
            endpoint: "https://ims-na1.adobelogin.com/ims/token/v3".to_string(),
            scopes: "AdobeID,openid".to_string(),
        }
    }
}

/// Where release note documents are stored and published.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Document {
    pub(crate) org: String,
    pub(crate) site: String,
    /// The folder within the site, documents land in `{folder}/{repo}/{number}`.
    pub(crate) folder: String,
    #[serde(rename = "ref")]
    pub(crate) reference: String,
    pub(crate) source_url: String,
    pub(crate) admin_url: String,
}

impl Document {
    /// The content path of the document for one pull request, without an extension.
    pub(crate) fn path(&self, repo: &str, number: u64) -> String {
        let mut path = String::new();
        for segment in [&self.org, &self.site, &self.folder] {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                path.push('/');
                path.push_str(segment);
            }
        }
        format!("{path}/{repo}/{number}")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self {
            org: "da-pilot".to_string(),
            site: "docket".to_string(),
            folder: "about/release-notes".to_string(),
            reference: "main".to_string(),
            source_url: "https://admin.da.live/source".to_string(),
            admin_url: "https://admin.hlx.page".to_string(),
        }
    }
}

/// Details for the email channel.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Email {
    #[serde(default = "Email::default_endpoint")]
    pub(crate) endpoint: String,
    pub(crate) template_id: String,
    pub(crate) from: String,
    pub(crate) to: Vec<String>,
}

impl Email {
    fn default_endpoint() -> String {
        "https://api.sendgrid.com/v3/mail/send".to_string()
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Could not read {path}: {source}")]
    #[diagnostic(
        code(config::read),
        help("Check that the path passed to --config exists and is readable.")
    )]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {message}")]
    #[diagnostic(code(config::toml), help("Check the TOML is valid."))]
    Toml {
        message: String,
        #[source_code]
        source_code: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },
    #[error("The [notes] marker in {path} is empty")]
    #[diagnostic(
        code(config::empty_marker),
        help("An empty marker matches every pull request body. Remove the key to use \"## Release notes\".")
    )]
    EmptyMarker { path: String },
}
