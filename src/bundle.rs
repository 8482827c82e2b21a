use std::collections::BTreeMap;

use serde_json::json;

use crate::error::FetchError;

pub const TOKENIZER_JSON: &str = "tokenizer.json";
pub const TOKENIZER_CONFIG: &str = "tokenizer_config.json";
pub const SPECIAL_TOKENS_MAP: &str = "special_tokens_map.json";
pub const ADDED_TOKENS: &str = "added_tokens.json";

/// Vocabulary files; any one of these (or `tokenizer.json`) is enough for a loader.
pub const VOCAB_FILES: &[&str] = &[
    "vocab.txt",
    "vocab.json",
    "spiece.model",
    "sentencepiece.bpe.model",
    "tokenizer.model",
    "bpe.codes",
];

/// Files that only make sense next to a tokenizer definition.
pub const COMPANION_FILES: &[&str] = &[
    "merges.txt",
    TOKENIZER_CONFIG,
    SPECIAL_TOKENS_MAP,
    ADDED_TOKENS,
    "chat_template.jinja",
];

/// Whether `name` is a top-level file that belongs in a tokenizer bundle.
pub fn is_tokenizer_file(name: &str) -> bool {
    name == TOKENIZER_JSON || VOCAB_FILES.contains(&name) || COMPANION_FILES.contains(&name)
}

/// Picks the tokenizer files out of a repository listing, sorted and deduplicated.
pub fn select_tokenizer_files<I, S>(listing: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = listing
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .filter(|name| is_tokenizer_file(name))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// True when the names include `tokenizer.json` or a vocabulary file.
pub fn has_definition<S: AsRef<str>>(names: &[S]) -> bool {
    names.iter().any(|n| {
        let n = n.as_ref();
        n == TOKENIZER_JSON || VOCAB_FILES.contains(&n)
    })
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// One named file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    name: String,
    content: Vec<u8>,
}

impl BundleFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Result<Self, FetchError> {
        let name = name.into();
        if !is_plain_file_name(&name) {
            return Err(FetchError::InvalidTokenizer {
                path: name.into(),
                message: "bundle file names must not contain path separators".into(),
            });
        }
        Ok(Self { name, content })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Set of files making up a usable tokenizer, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct ArtifactBundle {
    files: BTreeMap<String, BundleFile>,
}

impl ArtifactBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any earlier file with the same name.
    pub fn insert(&mut self, file: BundleFile) {
        self.files.insert(file.name.clone(), file);
    }

    pub fn get(&self, name: &str) -> Option<&BundleFile> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn files(&self) -> impl Iterator<Item = &BundleFile> {
        self.files.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(BundleFile::len).sum()
    }

    /// Checks that a loader could build a tokenizer from this bundle.
    pub fn ensure_complete(&self, origin: &str) -> Result<(), FetchError> {
        if has_definition(&self.names()) {
            Ok(())
        } else {
            Err(FetchError::IncompleteBundle {
                origin: origin.to_string(),
            })
        }
    }

    /// Adds a minimal `tokenizer_config.json` when the bundle has a `tokenizer.json`
    /// but no configuration. Returns whether a file was added.
    pub fn synthesize_config(&mut self) -> Result<bool, FetchError> {
        if self.contains(TOKENIZER_CONFIG) || !self.contains(TOKENIZER_JSON) {
            return Ok(false);
        }

        let config = json!({ "tokenizer_class": "PreTrainedTokenizerFast" });
        let mut content = serde_json::to_vec_pretty(&config).map_err(|e| {
            FetchError::InvalidTokenizer {
                path: TOKENIZER_CONFIG.into(),
                message: e.to_string(),
            }
        })?;
        content.push(b'\n');

        self.insert(BundleFile::new(TOKENIZER_CONFIG, content)?);
        Ok(true)
    }
}
