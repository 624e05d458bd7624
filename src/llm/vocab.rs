//! Vocabulary: word-level token <-> id mapping
//!
//! Handles:
//! - Token to id mapping (unknown tokens map to the reserved sentinel)
//! - Id to token reverse mapping
//! - JSON persistence shared by the training tool and the server

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Reserved id of the unknown-token sentinel
pub const UNK_ID: u32 = 0;
/// Surface form of the unknown-token sentinel
pub const UNK_TOKEN: &str = "<UNK>";

const VOCAB_FORMAT_VERSION: &str = "0.1.0";

#[derive(Serialize, Deserialize)]
struct VocabFile {
    version: String,
    vocab_size: usize,
    tokens: BTreeMap<String, u32>,
    special_tokens: SpecialTokens,
}

#[derive(Serialize, Deserialize)]
struct SpecialTokens {
    unk: u32,
}

/// Closed word vocabulary, immutable once built
#[derive(Clone, Debug)]
pub struct Vocab {
    /// Token → id mapping
    token_to_id: FxHashMap<String, u32>,
    /// Id → token, indexed by id
    id_to_token: Vec<String>,
}

impl Vocab {
    /// Vocabulary holding only the unknown-token sentinel
    pub fn new() -> Self {
        let mut token_to_id = FxHashMap::default();
        token_to_id.insert(UNK_TOKEN.to_string(), UNK_ID);

        Vocab {
            token_to_id,
            id_to_token: vec![UNK_TOKEN.to_string()],
        }
    }

    /// Build a vocabulary assigning ids in discovery order
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Vocab::new();
        for token in tokens {
            let token = token.as_ref();
            if !vocab.token_to_id.contains_key(token) {
                let id = vocab.id_to_token.len() as u32;
                vocab.token_to_id.insert(token.to_string(), id);
                vocab.id_to_token.push(token.to_string());
            }
        }
        vocab
    }

    /// Load vocabulary from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let file: VocabFile = serde_json::from_str(&content)
            .map_err(|e| Error::serialization("failed to parse vocabulary", e))?;

        if file.special_tokens.unk != UNK_ID {
            return Err(Error::InvalidVocab(format!(
                "unknown token id must be {UNK_ID}, found {}",
                file.special_tokens.unk
            )));
        }
        if file.vocab_size != file.tokens.len() {
            return Err(Error::InvalidVocab(format!(
                "declared size {} does not match {} tokens",
                file.vocab_size,
                file.tokens.len()
            )));
        }

        Self::from_mapping(file.tokens)
    }

    /// Build from an explicit token → id mapping; ids must be dense and unique
    pub fn from_mapping(mapping: impl IntoIterator<Item = (String, u32)>) -> Result<Self> {
        let mut slots: Vec<Option<String>> = Vec::new();
        let mut token_to_id = FxHashMap::default();

        for (token, id) in mapping {
            let idx = id as usize;
            if idx >= slots.len() {
                slots.resize(idx + 1, None);
            }
            if let Some(existing) = &slots[idx] {
                return Err(Error::InvalidVocab(format!(
                    "id {id} assigned to both {existing:?} and {token:?}"
                )));
            }
            slots[idx] = Some(token.clone());
            token_to_id.insert(token, id);
        }

        let id_to_token = slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| slot.ok_or_else(|| Error::InvalidVocab(format!("id {id} is unassigned"))))
            .collect::<Result<Vec<_>>>()?;

        match id_to_token.first() {
            Some(token) if token == UNK_TOKEN => {}
            Some(token) => {
                return Err(Error::InvalidVocab(format!(
                    "id {UNK_ID} must be {UNK_TOKEN}, found {token:?}"
                )))
            }
            None => return Err(Error::InvalidVocab("vocabulary is empty".to_string())),
        }

        Ok(Vocab {
            token_to_id,
            id_to_token,
        })
    }

    /// Convert token to id, falling back to the unknown sentinel
    pub fn encode(&self, token: &str) -> u32 {
        self.token_to_id.get(token).copied().unwrap_or(UNK_ID)
    }

    /// Encode a token sequence
    pub fn encode_all<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens.iter().map(|t| self.encode(t.as_ref())).collect()
    }

    /// Convert id to token; ids outside the vocabulary decode to the sentinel
    pub fn decode(&self, id: u32) -> &str {
        self.id_to_token
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or(UNK_TOKEN)
    }

    pub fn is_unknown(&self, id: u32) -> bool {
        id == UNK_ID || id as usize >= self.id_to_token.len()
    }

    /// Get vocabulary size, sentinel included
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// True when only the sentinel is present
    pub fn is_empty(&self) -> bool {
        self.id_to_token.len() <= 1
    }

    /// Save vocabulary to JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = VocabFile {
            version: VOCAB_FORMAT_VERSION.to_string(),
            vocab_size: self.len(),
            tokens: self
                .token_to_id
                .iter()
                .map(|(token, &id)| (token.clone(), id))
                .collect(),
            special_tokens: SpecialTokens { unk: UNK_ID },
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::serialization("failed to serialize vocabulary", e))?;
        fs::write(path, json).map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new()
    }
}
