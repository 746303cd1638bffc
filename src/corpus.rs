use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::ConfigError;

static WORDS_DIR: Dir = include_dir!("src/words");

/// Number of words appended each time the cursor reaches the frontier of the
/// materialized text.
pub const EXTEND_BATCH: usize = 50;

/// A fixed word list the generator draws from.
#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Corpus {
    /// Load an embedded corpus by name (e.g. "english").
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        let file = WORDS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| ConfigError::BadCorpusFile(name.to_string()))?;

        let text = file
            .contents_utf8()
            .ok_or_else(|| ConfigError::BadCorpusFile(name.to_string()))?;

        let corpus: Corpus =
            serde_json::from_str(text).map_err(|_| ConfigError::BadCorpusFile(name.to_string()))?;

        if corpus.words.is_empty() {
            return Err(ConfigError::EmptyCorpus(corpus.name));
        }

        Ok(corpus)
    }

    /// Build a corpus from an in-memory word list.
    pub fn from_words(name: &str, words: Vec<String>) -> Result<Self, ConfigError> {
        if words.is_empty() {
            return Err(ConfigError::EmptyCorpus(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            size: words.len() as u32,
            words,
        })
    }
}

/// Draws words from a corpus. The production source is unseeded; the seeded
/// variant keeps generation reproducible in tests.
pub trait WordSource: Send {
    fn draw(&mut self, corpus: &Corpus, count: usize) -> Vec<String>;
}

/// Uniform independent draws from the OS-seeded thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSource;

impl WordSource for RandomSource {
    fn draw(&mut self, corpus: &Corpus, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| corpus.words[rng.gen_range(0..corpus.words.len())].clone())
            .collect()
    }
}

/// Deterministic source for tests.
#[derive(Debug)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl WordSource for SeededSource {
    fn draw(&mut self, corpus: &Corpus, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| corpus.words[self.rng.gen_range(0..corpus.words.len())].clone())
            .collect()
    }
}

/// Produces the target text stream for a session. Never runs dry: `extend`
/// appends a fresh batch whenever the session asks for more.
pub struct TextGenerator {
    corpus: Corpus,
    source: Box<dyn WordSource>,
}

impl TextGenerator {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus,
            source: Box::new(RandomSource),
        }
    }

    pub fn with_source(corpus: Corpus, source: Box<dyn WordSource>) -> Self {
        Self { corpus, source }
    }

    pub fn corpus_name(&self) -> &str {
        &self.corpus.name
    }

    /// Draw `count` words independently and uniformly at random.
    pub fn generate(&mut self, count: usize) -> Vec<String> {
        self.source.draw(&self.corpus, count)
    }

    /// Render `count` freshly drawn words as a space-joined prompt.
    pub fn prompt(&mut self, count: usize) -> String {
        self.generate(count).iter().join(" ")
    }

    /// Append a separator plus `EXTEND_BATCH` more words to `target`.
    pub fn extend(&mut self, target: &mut String) {
        let batch = self.prompt(EXTEND_BATCH);
        target.push(' ');
        target.push_str(&batch);
    }
}
