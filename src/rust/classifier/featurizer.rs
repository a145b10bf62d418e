use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::whitespace::WhitespaceSplit;
use tokenizers::{NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use super::error::PipelineError;
use super::utils::{normalize_vector, Norm};
use crate::data::{Column, DataView, SparseVector, VectorColumn};

const WORD_SEPARATOR: &str = "|";
const TEXT_START: char = '\u{2}';
const TEXT_END: char = '\u{3}';

/// Settings for turning a text column into a bag of n-gram counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFeaturizerOptions {
    pub lowercase: bool,
    pub strip_accents: bool,
    /// Word n-grams of every length from 1 up to this value are extracted
    pub word_ngram_length: usize,
    /// Character n-grams of exactly this length are extracted; 0 disables them
    pub char_ngram_length: usize,
    /// Vocabulary cap for each of the word and character families
    pub max_ngrams: usize,
    pub norm: Norm,
}

impl Default for TextFeaturizerOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_accents: true,
            word_ngram_length: 2,
            char_ngram_length: 3,
            max_ngrams: 10_000_000,
            norm: Norm::L2,
        }
    }
}

impl TextFeaturizerOptions {
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.word_ngram_length == 0 && self.char_ngram_length == 0 {
            return Err(PipelineError::Validation(
                "At least one of word or character n-grams must be enabled".into(),
            ));
        }
        if self.max_ngrams == 0 {
            return Err(PipelineError::Validation("max_ngrams must be positive".into()));
        }
        Ok(())
    }
}

/// N-gram terms in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Returns the term's id, adding it if the vocabulary is below `cap`.
    pub fn insert(&mut self, term: &str, cap: usize) -> Option<u32> {
        if let Some(&id) = self.index.get(term) {
            return Some(id);
        }
        if self.terms.len() >= cap {
            return None;
        }
        let id = self.terms.len() as u32;
        self.terms.push(term.to_string());
        self.index.insert(term.to_string(), id);
        Some(id)
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();
        Self { terms, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

/// Normalizes and splits text the same way at fit and transform time.
struct TextAnalyzer {
    normalizer: BertNormalizer,
    splitter: WhitespaceSplit,
    word_ngram_length: usize,
    char_ngram_length: usize,
}

impl TextAnalyzer {
    fn new(options: &TextFeaturizerOptions) -> Self {
        Self {
            normalizer: BertNormalizer::new(true, false, Some(options.strip_accents), options.lowercase),
            splitter: WhitespaceSplit,
            word_ngram_length: options.word_ngram_length,
            char_ngram_length: options.char_ngram_length,
        }
    }

    fn words(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        let mut normalized = NormalizedString::from(text);
        self.normalizer
            .normalize(&mut normalized)
            .map_err(|e| PipelineError::Featurization(e.to_string()))?;

        let mut pretokenized = PreTokenizedString::from(normalized);
        self.splitter
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| PipelineError::Featurization(e.to_string()))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(word, _, _)| word.to_string())
            .collect())
    }

    /// Word n-grams of lengths 1..=n followed by character n-grams.
    fn ngrams(&self, text: &str) -> Result<(Vec<String>, Vec<String>), PipelineError> {
        let words = self.words(text)?;

        let mut word_ngrams = Vec::new();
        for n in 1..=self.word_ngram_length {
            word_ngrams.extend(words.windows(n).map(|w| w.join(WORD_SEPARATOR)));
        }

        let mut char_ngrams = Vec::new();
        if self.char_ngram_length > 0 && !words.is_empty() {
            let chars: Vec<char> = std::iter::once(TEXT_START)
                .chain(words.join(" ").chars())
                .chain(std::iter::once(TEXT_END))
                .collect();
            char_ngrams.extend(chars.windows(self.char_ngram_length).map(|w| w.iter().collect::<String>()));
        }

        Ok((word_ngrams, char_ngrams))
    }
}

/// A fitted text featurizer: maps a text column to n-gram frequency vectors.
///
/// Word n-grams occupy the first `word_vocabulary.len()` dimensions, character
/// n-grams the rest. N-grams not seen during fitting are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFeaturizer {
    pub input: String,
    pub output: String,
    pub options: TextFeaturizerOptions,
    word_vocabulary: Vocabulary,
    char_vocabulary: Vocabulary,
}

impl TextFeaturizer {
    /// Builds the n-gram vocabularies from every row of the input column.
    pub fn fit(
        view: &DataView,
        input: &str,
        output: &str,
        options: &TextFeaturizerOptions,
    ) -> Result<Self, PipelineError> {
        options.validate()?;
        let analyzer = TextAnalyzer::new(options);
        let mut word_vocabulary = Vocabulary::default();
        let mut char_vocabulary = Vocabulary::default();

        for text in view.text(input)? {
            let (words, chars) = analyzer.ngrams(text)?;
            for term in &words {
                word_vocabulary.insert(term, options.max_ngrams);
            }
            for term in &chars {
                char_vocabulary.insert(term, options.max_ngrams);
            }
        }

        debug!(
            "Featurizer '{}' -> '{}': {} word n-grams, {} char n-grams",
            input,
            output,
            word_vocabulary.len(),
            char_vocabulary.len()
        );

        Ok(Self {
            input: input.to_string(),
            output: output.to_string(),
            options: options.clone(),
            word_vocabulary,
            char_vocabulary,
        })
    }

    pub fn dimension(&self) -> usize {
        self.word_vocabulary.len() + self.char_vocabulary.len()
    }

    pub fn featurize(&self, text: &str) -> Result<SparseVector, PipelineError> {
        self.featurize_with(&TextAnalyzer::new(&self.options), text)
    }

    fn featurize_with(&self, analyzer: &TextAnalyzer, text: &str) -> Result<SparseVector, PipelineError> {
        let (words, chars) = analyzer.ngrams(text)?;
        let word_count = self.word_vocabulary.len() as u32;
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();

        for id in words.iter().filter_map(|t| self.word_vocabulary.get(t)) {
            *counts.entry(id).or_insert(0.0) += 1.0;
        }
        for id in chars.iter().filter_map(|t| self.char_vocabulary.get(t)) {
            *counts.entry(word_count + id).or_insert(0.0) += 1.0;
        }

        let mut vector = SparseVector::from_entries(self.dimension(), counts);
        normalize_vector(&mut vector, self.options.norm);
        Ok(vector)
    }

    pub fn transform(&self, mut view: DataView) -> Result<DataView, PipelineError> {
        let analyzer = TextAnalyzer::new(&self.options);
        let rows = view
            .text(&self.input)?
            .iter()
            .map(|text| self.featurize_with(&analyzer, text))
            .collect::<Result<Vec<_>, _>>()?;
        let column = VectorColumn::new(self.dimension(), rows)?;
        view.set_column(self.output.as_str(), Column::Vector(column))?;
        Ok(view)
    }
}
