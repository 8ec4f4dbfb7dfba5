use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?]+\s+)").expect("sentence pattern is valid"));

/// Split text into batches that respect sentence boundaries.
/// Each batch is at most `max_batch_size` bytes.
pub fn split_into_batches(text: &str, max_batch_size: usize) -> Vec<String> {
    if text.len() <= max_batch_size {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current_batch = String::new();
    let mut last_end = 0;

    for mat in SENTENCE_END.find_iter(text) {
        let sentence = &text[last_end..mat.end()];

        if !current_batch.is_empty() && current_batch.len() + sentence.len() > max_batch_size {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        if sentence.len() > max_batch_size {
            push_hard_split(&mut batches, sentence, max_batch_size);
        } else {
            current_batch.push_str(sentence);
        }
        last_end = mat.end();
    }

    // Remaining text after the last sentence boundary
    if last_end < text.len() {
        let remaining = &text[last_end..];

        if !current_batch.is_empty() && current_batch.len() + remaining.len() > max_batch_size {
            batches.push(current_batch.trim().to_string());
            current_batch = String::new();
        }

        if remaining.len() > max_batch_size {
            push_hard_split(&mut batches, remaining, max_batch_size);
        } else {
            current_batch.push_str(remaining);
        }
    }

    if !current_batch.trim().is_empty() {
        batches.push(current_batch.trim().to_string());
    }

    batches
}

/// Split a run without sentence boundaries on char boundaries
fn push_hard_split(batches: &mut Vec<String>, text: &str, max_batch_size: usize) {
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > max_batch_size {
            batches.push(std::mem::take(&mut chunk));
        }
        chunk.push(c);
    }
    if !chunk.trim().is_empty() {
        batches.push(chunk);
    }
}
