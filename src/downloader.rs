use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::bundle::{has_definition, select_tokenizer_files, ArtifactBundle, BundleFile};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::hub::{ArtifactSource, HubSource};
use crate::model_id::ModelId;
use crate::verify::{verify_dir, VerifyReport};
use crate::writer::{write_bundle, SavedFile};

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub model_id: ModelId,
    pub revision: String,
    pub destination: PathBuf,
    pub files: Vec<SavedFile>,
    /// The repository listing came from the local cache instead of the hub.
    pub from_cache: bool,
    /// `tokenizer_config.json` was generated because the repository had none.
    pub synthesized_config: bool,
    pub verified: Option<VerifyReport>,
}

impl FetchReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Tokenizer downloader: resolves a model id to a bundle and saves it to a directory.
pub struct ArtifactFetcher<S> {
    source: S,
    revision: String,
    verify: bool,
}

impl ArtifactFetcher<HubSource> {
    /// Fetcher backed by the Hugging Face Hub.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let source = HubSource::new(config)?;
        Ok(Self::new(source)
            .with_revision(config.revision.clone())
            .with_verify(config.verify))
    }
}

impl<S: ArtifactSource> ArtifactFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            revision: crate::config::DEFAULT_REVISION.to_string(),
            verify: true,
        }
    }

    /// Revision recorded in reports. The source decides what it actually serves.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Tokenizer file names a fetch of `id` would retrieve.
    pub fn list(&self, id: &ModelId) -> Result<Vec<String>, FetchError> {
        let listing = self.source.list_files(id)?;
        Ok(select_tokenizer_files(&listing.files))
    }

    /// Resolves `id` into a complete bundle without touching the filesystem
    /// outside the source's cache.
    pub fn resolve(&self, id: &ModelId) -> Result<(ArtifactBundle, bool), FetchError> {
        self.resolve_with_progress(id, &mut |_: &str| {})
    }

    fn resolve_with_progress<F>(
        &self,
        id: &ModelId,
        progress_fn: &mut F,
    ) -> Result<(ArtifactBundle, bool), FetchError>
    where
        F: FnMut(&str),
    {
        progress_fn(&format!("Resolving {id}..."));
        let listing = self.source.list_files(id)?;
        let names = select_tokenizer_files(&listing.files);
        debug!("Tokenizer files for {}: {:?}", id, names);

        if !has_definition(&names) {
            return Err(FetchError::IncompleteBundle {
                origin: id.to_string(),
            });
        }

        let mut bundle = ArtifactBundle::new();
        let total = names.len();
        for (idx, name) in names.iter().enumerate() {
            progress_fn(&format!("Downloading {name} ({}/{total})...", idx + 1));
            let path = self.source.fetch_file(id, name)?;
            let content = std::fs::read(&path).map_err(|e| FetchError::io(&path, e))?;
            bundle.insert(BundleFile::new(name.as_str(), content)?);
        }

        bundle.ensure_complete(id.as_str())?;
        Ok((bundle, listing.from_cache))
    }

    pub fn fetch_and_save(&self, id: &ModelId, destination: &Path) -> Result<FetchReport, FetchError> {
        self.fetch_and_save_with_progress(id, destination, |_| {})
    }

    /// Resolves `id` and writes its files into `destination`, overwriting files
    /// with the same names. Nothing is written unless resolution succeeds.
    pub fn fetch_and_save_with_progress<F>(
        &self,
        id: &ModelId,
        destination: &Path,
        mut progress_fn: F,
    ) -> Result<FetchReport, FetchError>
    where
        F: FnMut(&str),
    {
        info!("Fetching tokenizer {} (revision {})", id, self.revision);

        let (mut bundle, from_cache) = self.resolve_with_progress(id, &mut progress_fn)?;
        if from_cache {
            warn!("Using cached listing for {}", id);
        }

        let synthesized_config = bundle.synthesize_config()?;
        if synthesized_config {
            warn!("{} has no tokenizer_config.json; writing a minimal one", id);
        }

        progress_fn(&format!("Saving {} file(s) to {}...", bundle.len(), destination.display()));
        let files = write_bundle(&bundle, destination)?;
        info!(
            "Saved {} file(s), {} bytes, to {}",
            files.len(),
            bundle.total_bytes(),
            destination.display()
        );

        let verified = if self.verify {
            progress_fn("Verifying saved tokenizer...");
            Some(verify_dir(destination)?)
        } else {
            None
        };

        progress_fn("Tokenizer saved successfully!");

        Ok(FetchReport {
            model_id: id.clone(),
            revision: self.revision.clone(),
            destination: destination.to_path_buf(),
            files,
            from_cache,
            synthesized_config,
            verified,
        })
    }
}

/// Fetches `identifier` from the Hugging Face Hub into `destination` using
/// default settings plus `HF_TOKEN`/`HF_HOME`/`HF_HUB_OFFLINE` from the environment.
pub fn fetch_and_save(identifier: &str, destination: &Path) -> Result<FetchReport, FetchError> {
    let id = ModelId::parse(identifier)?;
    let config = FetchConfig::from_env();
    ArtifactFetcher::from_config(&config)?.fetch_and_save(&id, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Listing;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Serves one repository from a temp directory and records requested files.
    struct StubSource {
        root: TempDir,
        listing: Vec<String>,
        requested: RefCell<Vec<String>>,
    }

    impl StubSource {
        fn new(files: &[(&str, &str)], extra_listing: &[&str]) -> Self {
            let root = TempDir::new().unwrap();
            let mut listing: Vec<String> = extra_listing.iter().map(|s| s.to_string()).collect();
            for (name, content) in files {
                std::fs::write(root.path().join(name), content).unwrap();
                listing.push(name.to_string());
            }
            Self {
                root,
                listing,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl ArtifactSource for StubSource {
        fn list_files(&self, _id: &ModelId) -> Result<Listing, FetchError> {
            Ok(Listing::remote(self.listing.clone()))
        }

        fn fetch_file(&self, id: &ModelId, file: &str) -> Result<PathBuf, FetchError> {
            self.requested.borrow_mut().push(file.to_string());
            let path = self.root.path().join(file);
            if path.exists() {
                Ok(path)
            } else {
                Err(FetchError::FileNotFound {
                    model_id: id.to_string(),
                    file: file.to_string(),
                })
            }
        }
    }

    fn id() -> ModelId {
        ModelId::parse("org/example-tokenizer").unwrap()
    }

    #[test]
    fn only_tokenizer_files_are_downloaded() {
        let source = StubSource::new(
            &[("vocab.txt", "[UNK]\n"), ("tokenizer_config.json", "{}")],
            &["model.safetensors", "config.json", "onnx/model.onnx"],
        );
        let fetcher = ArtifactFetcher::new(source).with_verify(false);

        let (bundle, from_cache) = fetcher.resolve(&id()).unwrap();
        assert!(!from_cache);
        assert_eq!(bundle.names(), vec!["tokenizer_config.json", "vocab.txt"]);

        let mut requested = fetcher.source().requested.borrow().clone();
        requested.sort();
        assert_eq!(requested, vec!["tokenizer_config.json", "vocab.txt"]);
    }

    #[test]
    fn repository_without_tokenizer_is_incomplete_and_writes_nothing() {
        let source = StubSource::new(&[("config.json", "{}")], &["model.safetensors"]);
        let fetcher = ArtifactFetcher::new(source);
        let out = TempDir::new().unwrap();
        let dest = out.path().join("models");

        let err = fetcher.fetch_and_save(&id(), &dest).unwrap_err();
        assert!(matches!(err, FetchError::IncompleteBundle { .. }));
        assert!(!dest.exists());
        assert!(fetcher.source().requested.borrow().is_empty());
    }

    #[test]
    fn progress_reports_each_step() {
        let source = StubSource::new(&[("vocab.txt", "[UNK]\n")], &[]);
        let fetcher = ArtifactFetcher::new(source);
        let out = TempDir::new().unwrap();

        let mut steps = Vec::new();
        let report = fetcher
            .fetch_and_save_with_progress(&id(), out.path(), |msg| steps.push(msg.to_string()))
            .unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.total_bytes(), 6);
        assert!(report.verified.is_some());
        assert_eq!(steps.first().map(String::as_str), Some("Resolving org/example-tokenizer..."));
        assert!(steps.iter().any(|s| s == "Downloading vocab.txt (1/1)..."));
        assert_eq!(steps.last().map(String::as_str), Some("Tokenizer saved successfully!"));
    }

    #[test]
    fn listing_is_filtered_like_a_fetch() {
        let source = StubSource::new(
            &[("tokenizer.json", "{}"), ("special_tokens_map.json", "{}")],
            &["pytorch_model.bin"],
        );
        let fetcher = ArtifactFetcher::new(source);

        let names = fetcher.list(&id()).unwrap();
        assert_eq!(names, vec!["special_tokens_map.json", "tokenizer.json"]);
        assert!(fetcher.source().requested.borrow().is_empty());
    }
}
