use std::collections::HashMap;

const SOFT_HYPHEN: char = '\u{00AD}';

/// Splits a word into clusters, the smallest pieces text may wrap between.
///
/// Concatenating the clusters gives back the word minus any soft hyphens.
pub trait Hyphenator: Send + Sync {
    fn hyphenate(&self, word: &str) -> Vec<String>;
}

/// Breaks only after explicit hyphens and at soft hyphens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHyphenation;

impl Hyphenator for NoHyphenation {
    fn hyphenate(&self, word: &str) -> Vec<String> {
        explicit_breaks(word)
    }
}

fn explicit_breaks(word: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        match c {
            SOFT_HYPHEN => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            '-' => {
                current.push(c);
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Liang hyphenation over TeX-style patterns such as `hy3ph` or `.ab4`.
///
/// Patterns are the language dictionary and come from the caller. Breaks
/// closer than `left_min` / `right_min` characters to either end are dropped.
#[derive(Debug, Clone)]
pub struct PatternHyphenator {
    patterns: HashMap<String, Vec<u8>>,
    max_pattern_len: usize,
    left_min: usize,
    right_min: usize,
}

impl PatternHyphenator {
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = HashMap::new();
        let mut max_pattern_len = 0;
        for pattern in patterns {
            let (letters, values) = parse_pattern(pattern);
            if letters.is_empty() {
                continue;
            }
            max_pattern_len = max_pattern_len.max(letters.chars().count());
            table.insert(letters, values);
        }
        Self {
            patterns: table,
            max_pattern_len,
            left_min: 2,
            right_min: 2,
        }
    }

    /// Whitespace-separated patterns, the layout of TeX `hyph-*.pat.txt` files.
    pub fn from_pattern_text(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    pub fn with_min(mut self, left_min: usize, right_min: usize) -> Self {
        self.left_min = left_min.max(1);
        self.right_min = right_min.max(1);
        self
    }

    fn hyphenate_part(&self, part: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = part.chars().collect();
        let n = chars.len();
        if n < self.left_min + self.right_min || !chars.iter().all(|c| c.is_alphabetic()) {
            out.push(part.to_string());
            return;
        }

        let work: Vec<char> = std::iter::once('.')
            .chain(chars.iter().flat_map(|c| c.to_lowercase()))
            .chain(std::iter::once('.'))
            .collect();
        // Lowercasing may change the length (e.g. 'İ'); fall back to no breaks.
        if work.len() != n + 2 {
            out.push(part.to_string());
            return;
        }

        let mut points = vec![0u8; work.len() + 1];
        for start in 0..work.len() {
            let end_max = (start + self.max_pattern_len).min(work.len());
            for end in start + 1..=end_max {
                let key: String = work[start..end].iter().collect();
                if let Some(values) = self.patterns.get(&key) {
                    for (k, v) in values.iter().enumerate() {
                        let slot = &mut points[start + k];
                        *slot = (*slot).max(*v);
                    }
                }
            }
        }

        let mut current = String::new();
        for (k, c) in chars.iter().enumerate() {
            current.push(*c);
            let taken = k + 1;
            if points[k + 2] % 2 == 1 && taken >= self.left_min && n - taken >= self.right_min {
                out.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
}

impl Hyphenator for PatternHyphenator {
    fn hyphenate(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        for part in explicit_breaks(word) {
            self.hyphenate_part(&part, &mut out);
        }
        out
    }
}

fn parse_pattern(pattern: &str) -> (String, Vec<u8>) {
    let mut letters = String::new();
    let mut values = vec![0u8];
    for c in pattern.chars() {
        match c.to_digit(10) {
            Some(d) => {
                if let Some(last) = values.last_mut() {
                    *last = d as u8;
                }
            }
            None => {
                letters.push(c);
                values.push(0);
            }
        }
    }
    (letters, values)
}
