//! Deterministic chunking of page text for the vector index.

/// Split text into chunks of at most `max_len` characters, with a word-level
/// overlap of roughly `overlap` characters carried between consecutive
/// chunks so context survives the boundary.
///
/// The split is a pure function of the input: identical text always yields
/// identical boundaries. Words longer than `max_len` are hard-split.
#[must_use]
pub fn split_into_chunks(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }
    let overlap = overlap.min(max_len / 2);

    let words = presplit_words(text, max_len);
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut cur_len = 0usize;
    // Words in `current` not carried over from the previous chunk
    let mut fresh = 0usize;

    for word in words {
        let word_len = word.chars().count();
        let extended = if current.is_empty() {
            word_len
        } else {
            cur_len + 1 + word_len
        };

        if !current.is_empty() && extended > max_len && fresh > 0 {
            chunks.push(current.join(" "));

            // Seed the next chunk with the trailing words of this one
            let mut seed: Vec<String> = Vec::new();
            let mut seed_len = 0usize;
            for prev in current.iter().rev() {
                let prev_len = prev.chars().count();
                let grown = if seed.is_empty() {
                    prev_len
                } else {
                    seed_len + 1 + prev_len
                };
                if grown > overlap {
                    break;
                }
                seed.insert(0, prev.clone());
                seed_len = grown;
            }
            // The incoming word must still fit next to the seed
            while !seed.is_empty() && seed_len + 1 + word_len > max_len {
                seed.remove(0);
                seed_len = joined_len(&seed);
            }

            current = seed;
            cur_len = seed_len;
            fresh = 0;
        }

        cur_len = if current.is_empty() {
            word_len
        } else {
            cur_len + 1 + word_len
        };
        current.push(word);
        fresh += 1;
    }

    if fresh > 0 {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Whitespace-split the text, hard-splitting any word longer than `max_len`.
fn presplit_words(text: &str, max_len: usize) -> Vec<String> {
    let mut words = Vec::new();
    for word in text.split_whitespace() {
        if word.chars().count() <= max_len {
            words.push(word.to_string());
        } else {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_len) {
                words.push(piece.iter().collect());
            }
        }
    }
    words
}

fn joined_len(words: &[String]) -> usize {
    if words.is_empty() {
        0
    } else {
        words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1
    }
}
