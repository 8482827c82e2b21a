use std::path::{Path, PathBuf};

use tokenizers::Tokenizer;

use crate::bundle::{
    has_definition, is_tokenizer_file, ADDED_TOKENS, SPECIAL_TOKENS_MAP, TOKENIZER_CONFIG,
    TOKENIZER_JSON,
};
use crate::error::FetchError;

/// What a saved tokenizer directory turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub directory: PathBuf,
    pub files: Vec<String>,
    /// Vocabulary size including added tokens, when `tokenizer.json` is present.
    pub vocab_size: Option<usize>,
}

/// Checks that `dir` holds a tokenizer a downstream loader can read unmodified.
pub fn verify_dir(dir: &Path) -> Result<VerifyReport, FetchError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FetchError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FetchError::io(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_tokenizer_file(&name) {
            files.push(name);
        }
    }
    files.sort();

    if !has_definition(&files) {
        return Err(FetchError::IncompleteBundle {
            origin: dir.display().to_string(),
        });
    }

    for name in [TOKENIZER_CONFIG, SPECIAL_TOKENS_MAP, ADDED_TOKENS] {
        if files.iter().any(|f| f == name) {
            check_json_object(&dir.join(name))?;
        }
    }

    let vocab_size = if files.iter().any(|f| f == TOKENIZER_JSON) {
        Some(load_tokenizer(&dir.join(TOKENIZER_JSON))?.get_vocab_size(true))
    } else {
        None
    };

    Ok(VerifyReport {
        directory: dir.to_path_buf(),
        files,
        vocab_size,
    })
}

/// Loads a `tokenizer.json` with the `tokenizers` crate.
pub fn load_tokenizer(path: &Path) -> Result<Tokenizer, FetchError> {
    Tokenizer::from_file(path).map_err(|e| FetchError::InvalidTokenizer {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn check_json_object(path: &Path) -> Result<(), FetchError> {
    let content = std::fs::read(path).map_err(|e| FetchError::io(path, e))?;
    let value: serde_json::Value =
        serde_json::from_slice(&content).map_err(|e| FetchError::InvalidTokenizer {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if value.is_object() {
        Ok(())
    } else {
        Err(FetchError::InvalidTokenizer {
            path: path.to_path_buf(),
            message: "expected a JSON object".into(),
        })
    }
}
