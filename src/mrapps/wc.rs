use anyhow::Context;

use crate::mr::{Emitter, MRApp, Record, WorkFuture};

/// Word count: each input value names a file; the output is word -> [count].
pub struct WC;

impl MRApp for WC {
    fn map(&self, input: Record, emit: Emitter) -> WorkFuture {
        Box::pin(async move {
            for path in &input.values {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {path}"))?;
                for word in words(&contents) {
                    emit.emit_kv(word, "1");
                }
            }
            Ok(())
        })
    }

    fn reduce(&self, input: Record, emit: Emitter) -> WorkFuture {
        Box::pin(async move {
            emit.emit_kv(input.key, input.values.len().to_string());
            Ok(())
        })
    }
}

/// Maximal runs of alphabetic characters.
pub(crate) fn words(text: &str) -> Vec<&str> {
    // regular expression is an order of magnitude slower
    let mut res = vec![];
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphabetic(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                res.push(&text[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        res.push(&text[s..]);
    }
    res
}
