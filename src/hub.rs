use hf_hub::api::sync::{Api, ApiBuilder, ApiError, ApiRepo};
use hf_hub::{Cache, Repo, RepoType};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::bundle::{COMPANION_FILES, TOKENIZER_JSON, VOCAB_FILES};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::model_id::ModelId;

/// Where repository listings and file contents come from.
pub trait ArtifactSource {
    /// Lists the files of the repository behind `id`.
    fn list_files(&self, id: &ModelId) -> Result<Listing, FetchError>;

    /// Returns a local path holding the content of `file`.
    fn fetch_file(&self, id: &ModelId, file: &str) -> Result<PathBuf, FetchError>;
}

/// Repository listing, tagged with whether it came from the local cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<String>,
    pub from_cache: bool,
}

impl Listing {
    pub fn remote(files: Vec<String>) -> Self {
        Self {
            files,
            from_cache: false,
        }
    }

    pub fn cached(files: Vec<String>) -> Self {
        Self {
            files,
            from_cache: true,
        }
    }
}

/// Hugging Face Hub source using the blocking `hf-hub` client and its on-disk cache.
pub struct HubSource {
    api: Option<Api>,
    cache: Cache,
    cache_dir: PathBuf,
    revision: String,
    authenticated: bool,
}

impl HubSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let cache_dir = config.resolved_cache_dir();
        let cache = Cache::new(cache_dir.clone());
        let authenticated = config.token.is_some();

        let api = if config.offline {
            None
        } else {
            let mut builder = ApiBuilder::new()
                .with_cache_dir(cache_dir.clone())
                .with_progress(config.progress);
            if let Some(token) = &config.token {
                builder = builder.with_token(Some(token.clone()));
            }
            Some(
                builder
                    .build()
                    .map_err(|e| FetchError::Client(e.to_string()))?,
            )
        };

        Ok(Self {
            api,
            cache,
            cache_dir,
            revision: config.revision.clone(),
            authenticated,
        })
    }

    pub fn is_offline(&self) -> bool {
        self.api.is_none()
    }

    fn repo(&self, id: &ModelId) -> Repo {
        Repo::with_revision(id.to_string(), RepoType::Model, self.revision.clone())
    }

    fn api_repo(&self, id: &ModelId) -> Option<ApiRepo> {
        self.api.as_ref().map(|api| api.repo(self.repo(id)))
    }

    fn cached_file(&self, id: &ModelId, file: &str) -> Option<PathBuf> {
        self.cache.repo(self.repo(id)).get(file)
    }

    /// Maps an `hf-hub` error onto the fetch error taxonomy.
    fn classify(&self, id: &ModelId, file: Option<&str>, err: ApiError) -> FetchError {
        match err {
            ApiError::RequestError(e) => {
                classify_request(id, file, self.authenticated, &e.to_string())
            }
            ApiError::IoError(e) => FetchError::io(cache_path(&self.cache_dir, file), e),
            other => FetchError::Network {
                model_id: id.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Probes the cache for every known tokenizer file name.
    fn cached_listing(&self, id: &ModelId) -> Vec<String> {
        std::iter::once(TOKENIZER_JSON)
            .chain(VOCAB_FILES.iter().copied())
            .chain(COMPANION_FILES.iter().copied())
            .filter(|name| self.cached_file(id, name).is_some())
            .map(str::to_string)
            .collect()
    }
}

impl ArtifactSource for HubSource {
    fn list_files(&self, id: &ModelId) -> Result<Listing, FetchError> {
        let Some(repo) = self.api_repo(id) else {
            let files = self.cached_listing(id);
            if files.is_empty() {
                return Err(FetchError::Network {
                    model_id: id.to_string(),
                    message: "offline and no cached copy is available".into(),
                });
            }
            debug!("Offline listing for {} from cache: {:?}", id, files);
            return Ok(Listing::cached(files));
        };

        match repo.info() {
            Ok(info) => Ok(Listing::remote(
                info.siblings.into_iter().map(|s| s.rfilename).collect(),
            )),
            Err(e) => match self.classify(id, None, e) {
                FetchError::Network { model_id, message } => {
                    let files = self.cached_listing(id);
                    if files.is_empty() {
                        return Err(FetchError::Network { model_id, message });
                    }
                    warn!(
                        "Hub unreachable for {} ({}); using {} cached file(s)",
                        id,
                        message,
                        files.len()
                    );
                    Ok(Listing::cached(files))
                }
                other => Err(other),
            },
        }
    }

    fn fetch_file(&self, id: &ModelId, file: &str) -> Result<PathBuf, FetchError> {
        let Some(repo) = self.api_repo(id) else {
            return self.cached_file(id, file).ok_or_else(|| FetchError::Network {
                model_id: id.to_string(),
                message: format!("offline and {file} is not cached"),
            });
        };

        match repo.get(file) {
            Ok(path) => Ok(path),
            Err(e) => match self.classify(id, Some(file), e) {
                FetchError::Network { model_id, message } => {
                    match self.cached_file(id, file) {
                        Some(path) => {
                            warn!("Download of {} failed ({}); using cached copy", file, message);
                            Ok(path)
                        }
                        None => Err(FetchError::Network { model_id, message }),
                    }
                }
                other => Err(other),
            },
        }
    }
}

/// Local I/O failures happen while the client writes into its cache.
fn cache_path(cache_dir: &Path, file: Option<&str>) -> PathBuf {
    match file {
        Some(file) => cache_dir.join(file),
        None => cache_dir.to_path_buf(),
    }
}

/// The hub answers 401 rather than 404 for repositories that do not exist.
/// With a token configured, a 401 may instead mean the token lacks access.
fn classify_request(
    id: &ModelId,
    file: Option<&str>,
    authenticated: bool,
    message: &str,
) -> FetchError {
    let unauthorized = message.contains("status code 401");
    let missing = unauthorized || message.contains("status code 404");

    match (missing, file) {
        (true, _) if unauthorized && authenticated => FetchError::Unauthorized {
            model_id: id.to_string(),
        },
        (true, Some(file)) => FetchError::FileNotFound {
            model_id: id.to_string(),
            file: file.to_string(),
        },
        (true, None) => FetchError::NotFound {
            model_id: id.to_string(),
        },
        (false, _) => FetchError::Network {
            model_id: id.to_string(),
            message: message.to_string(),
        },
    }
}
