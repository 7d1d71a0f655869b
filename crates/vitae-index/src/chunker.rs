//! Segmentation of normalized resume text into retrievable passages.
//!
//! Passages follow the document's own structure: blank lines and bullet
//! markers start a new passage, recognised headings set the section label
//! of everything that follows. Short fragments are merged into a
//! neighbour and long ones are split at the nearest sentence or clause
//! boundary.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use vitae_core::{ChunkerConfig, Section};

use crate::normalize::normalize;

/// A passage of display text together with the section it was found under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Display text, whitespace-collapsed, without the bullet marker.
    pub text: String,
    /// Section label inferred from the closest preceding heading.
    pub section: Option<Section>,
}

/// Splits document text into ordered [`Passage`]s.
///
/// # Examples
///
/// ```
/// use vitae_core::ChunkerConfig;
/// use vitae_index::chunker::Chunker;
///
/// let chunker = Chunker::new(&ChunkerConfig::default());
/// let text = "EXPERIENCE\n\
///             - Built a distributed job scheduler handling ten million tasks a day\n\
///             - Mentored four engineers through their first production launches";
/// let passages = chunker.chunk(text);
/// assert_eq!(passages.len(), 2);
/// assert_eq!(passages[0].section.as_ref().unwrap().as_str(), "experience");
/// ```
#[derive(Debug, Clone)]
pub struct Chunker {
    min_chars: usize,
    max_chars: usize,
    min_words: usize,
    headings: HashSet<String>,
}

impl Chunker {
    /// Create a chunker with the given thresholds.
    pub fn new(config: &ChunkerConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            max_chars: config.max_chars.max(1),
            min_words: config.min_words,
            headings: config
                .section_headings
                .iter()
                .map(|h| Section::new(h).as_str().to_string())
                .collect(),
        }
    }

    /// Split `text` into passages in document order.
    ///
    /// Empty or whitespace-only input yields no passages.
    pub fn chunk(&self, text: &str) -> Vec<Passage> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let blocks = self.blocks(&normalized);
        let merged = self.merge_short(blocks);

        merged
            .into_iter()
            .flat_map(|p| {
                let section = p.section;
                split_long(&p.text, self.max_chars, self.min_chars)
                    .into_iter()
                    .map(move |text| Passage {
                        text,
                        section: section.clone(),
                    })
            })
            .collect()
    }

    fn heading(&self, line: &str) -> Option<Section> {
        let section = Section::new(line);
        self.headings.contains(section.as_str()).then_some(section)
    }

    /// Structural split: blank lines, bullets, and headings.
    fn blocks(&self, text: &str) -> Vec<Passage> {
        let mut blocks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut section: Option<Section> = None;

        for line in text.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                flush(&mut current, &section, &mut blocks);
                continue;
            }
            if let Some(heading) = self.heading(stripped) {
                flush(&mut current, &section, &mut blocks);
                section = Some(heading);
                continue;
            }
            match stripped.strip_prefix("- ") {
                Some(item) => {
                    flush(&mut current, &section, &mut blocks);
                    current.push(item);
                }
                None => current.push(stripped.trim_start_matches('-')),
            }
        }
        flush(&mut current, &section, &mut blocks);

        blocks
    }

    /// Fold fragments below `min_chars` into the following passage of the
    /// same section, or failing that into the preceding one.
    fn merge_short(&self, blocks: Vec<Passage>) -> Vec<Passage> {
        let mut out: Vec<Passage> = Vec::new();
        let mut carry: Option<Passage> = None;

        for block in blocks {
            let block = match carry.take() {
                Some(short) if short.section == block.section => Passage {
                    text: format!("{} {}", short.text, block.text),
                    section: block.section,
                },
                Some(short) => {
                    self.settle(short, &mut out);
                    block
                }
                None => block,
            };

            if block.text.len() < self.min_chars {
                carry = Some(block);
            } else {
                out.push(block);
            }
        }
        if let Some(short) = carry {
            self.settle(short, &mut out);
        }

        out
    }

    fn settle(&self, short: Passage, out: &mut Vec<Passage>) {
        if let Some(prev) = out.last_mut().filter(|p| p.section == short.section) {
            prev.text.push(' ');
            prev.text.push_str(&short.text);
            return;
        }
        if short.text.split_whitespace().count() >= self.min_words {
            out.push(short);
        } else {
            tracing::debug!(fragment = %short.text, "dropping short fragment");
        }
    }
}

fn flush(current: &mut Vec<&str>, section: &Option<Section>, out: &mut Vec<Passage>) {
    if current.is_empty() {
        return;
    }
    let joined = collapse_whitespace(&current.join(" "));
    current.clear();
    if !joined.is_empty() {
        out.push(Passage {
            text: joined,
            section: section.clone(),
        });
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into pieces of at most `max` bytes, cutting after sentence
/// punctuation where possible, then after a comma, then at whitespace.
/// A single word longer than `max` is the only thing ever cut mid-word.
///
/// Cuts leave at least `min` bytes on both sides whenever the text is long
/// enough for that, so splitting never produces a fragment the merge step
/// would have rejected.
fn split_long(text: &str, max: usize, min: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while rest.len() > max {
        let cut = find_cut(rest, max, min);
        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            pieces.push(head.to_string());
        }
        rest = tail.trim_start();
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }

    pieces
}

fn find_cut(text: &str, max: usize, min: usize) -> usize {
    let mut limit = max.min(text.len());
    // Reserve room for a tail of at least `min`, counting the separator
    // dropped at the cut.
    if text.len() > 2 * min + 1 {
        limit = limit.min(text.len() - min - 1);
    }
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    let floor = if limit > min { min.max(1) } else { 1 };
    let window = &text[..limit];
    let bytes = text.as_bytes();
    let followed_by_space = |i: usize| bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace);

    let sentence = window
        .rmatch_indices(['.', '!', '?', ';'])
        .map(|(i, _)| i)
        .find(|&i| i + 1 > floor && followed_by_space(i));
    if let Some(i) = sentence {
        return i + 1;
    }

    let clause = window
        .rmatch_indices(',')
        .map(|(i, _)| i)
        .find(|&i| i + 1 > floor && followed_by_space(i));
    if let Some(i) = clause {
        return i + 1;
    }

    if let Some(i) = window.rfind(char::is_whitespace).filter(|&i| i >= floor) {
        return i;
    }

    if limit == 0 {
        text.chars().next().map_or(text.len(), char::len_utf8)
    } else {
        limit
    }
}
