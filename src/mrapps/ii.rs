use anyhow::Context;
use regex::Regex;

use crate::mr::{Emitter, MRApp, Record, WorkFuture};

/// Inverted index: word -> the files containing it.
///
/// Map reads the file named by each input value and emits `word -> [file]`
/// once per occurrence; reduce drops the repeated file names.
pub struct InvertedIndex {
    word: Regex,
}

impl InvertedIndex {
    /// Words are whitespace separated.
    pub fn new() -> Self {
        InvertedIndex {
            word: Regex::new(r"\S+").expect("static pattern"),
        }
    }

    /// Words are the matches of `pattern`.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(InvertedIndex { word: Regex::new(pattern)? })
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MRApp for InvertedIndex {
    fn map(&self, input: Record, emit: Emitter) -> WorkFuture {
        let word = self.word.clone();
        Box::pin(async move {
            for path in &input.values {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("couldn't open file {path}"))?;
                for m in word.find_iter(&contents) {
                    emit.emit_kv(m.as_str(), path.clone());
                }
            }
            Ok(())
        })
    }

    fn reduce(&self, input: Record, emit: Emitter) -> WorkFuture {
        Box::pin(async move {
            let mut files = input.values;
            files.sort();
            files.dedup();
            emit.emit(Record::new(input.key, files));
            Ok(())
        })
    }
}
