use std::sync::Arc;

use foundation::{Position, Vec2};

use crate::font::{Font, Glyph};
use crate::hyphenation::Hyphenator;
use crate::segments::Segment;

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Cluster { text: String, last_in_word: bool },
    Space,
}

/// What a cursor yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Cluster { text: &'a str, last_in_word: bool },
    Space,
    ParagraphEnd,
    End,
}

/// Text split into paragraphs of hyphenation clusters, bound to a font.
#[derive(Clone)]
pub struct Text {
    string: String,
    paragraphs: Vec<Vec<Piece>>,
    font: Arc<dyn Font>,
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("string", &self.string)
            .field("paragraphs", &self.paragraphs.len())
            .finish()
    }
}

/// A glyph positioned by the composer. `pos` is the pen position on the
/// baseline, `segment` the segment it was laid on.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub glyph: Glyph,
    pub pos: Position,
    pub next_pos: Position,
    pub segment: Segment,
}

/// Read position inside a [`Text`].
#[derive(Debug, Clone, Copy)]
pub struct TextCursor<'a> {
    text: &'a Text,
    paragraph: usize,
    index: usize,
}

impl<'a> TextCursor<'a> {
    pub fn next(&mut self) -> Token<'a> {
        let text: &'a Text = self.text;
        let Some(par) = text.paragraphs.get(self.paragraph) else {
            return Token::End;
        };
        if self.index >= par.len() {
            self.paragraph += 1;
            self.index = 0;
            if self.paragraph >= text.paragraphs.len() {
                return Token::End;
            }
            return Token::ParagraphEnd;
        }
        let piece = &par[self.index];
        self.index += 1;
        match piece {
            Piece::Cluster { text, last_in_word } => Token::Cluster {
                text: text.as_str(),
                last_in_word: *last_in_word,
            },
            Piece::Space => Token::Space,
        }
    }

    /// Step back over the token just read within the current paragraph.
    pub fn rewind(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn is_at_end(&self) -> bool {
        self.paragraph >= self.text.paragraphs.len()
    }
}

impl Text {
    pub fn new(string: &str, font: Arc<dyn Font>, hyphenator: &dyn Hyphenator) -> Self {
        let paragraphs = string
            .split('\n')
            .map(|par| {
                let mut pieces = Vec::new();
                for (i, word) in par.split_whitespace().enumerate() {
                    if i > 0 {
                        pieces.push(Piece::Space);
                    }
                    let clusters = hyphenator.hyphenate(word);
                    let count = clusters.len();
                    for (k, cluster) in clusters.into_iter().enumerate() {
                        pieces.push(Piece::Cluster {
                            text: cluster,
                            last_in_word: k + 1 == count,
                        });
                    }
                }
                pieces
            })
            .collect();
        Self {
            string: string.to_string(),
            paragraphs,
            font,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }

    pub fn font(&self) -> &dyn Font {
        self.font.as_ref()
    }

    pub fn cursor(&self) -> TextCursor<'_> {
        TextCursor {
            text: self,
            paragraph: 0,
            index: 0,
        }
    }

    /// Sum of glyph advances at `font_size`, line breaks excluded.
    pub fn flat_length(&self, font_size: f64) -> f64 {
        let scale = font_size / self.font.units_per_em();
        self.string
            .chars()
            .filter(|c| *c != '\n' && *c != '\u{00AD}')
            .map(|c| self.font.glyph(c).advance * scale)
            .sum()
    }

    /// Greedy composer: consume tokens from `cursor` into `segments`.
    ///
    /// Returns the cursor to resume from (`None` once the text is exhausted)
    /// and the placed glyphs. A cluster is placed only when it fits in what is
    /// left of the current segment; otherwise the composer moves to the next
    /// segment. When `merge` is false each segment is a separate line: a word
    /// broken across segments gets a hyphen glyph and leading spaces are
    /// skipped. When `merge` is true (text along a line) the next segment
    /// starts at the current pen position.
    pub fn draw<'a>(
        &'a self,
        font_size: f64,
        segments: &[Segment],
        mut cursor: TextCursor<'a>,
        merge: bool,
    ) -> (Option<TextCursor<'a>>, Vec<PlacedGlyph>) {
        let mut placed = Vec::new();
        let Some(first) = segments.first() else {
            return (Some(cursor), placed);
        };

        let font = self.font.as_ref();
        let scale = font_size / font.units_per_em();
        let hyphen = font.glyph('-');
        let hyphen_advance = if merge { 0.0 } else { hyphen.advance * scale };

        let mut seg_idx = 0;
        let mut cs: Segment = *first;
        let mut cur = Vec2::from(cs[0]);
        let mut end = Vec2::from(cs[1]);
        let mut at_start = true;
        let mut mid_word = false;

        loop {
            let mut overflow = false;
            match cursor.next() {
                Token::End => return (None, placed),
                Token::ParagraphEnd => overflow = true,
                Token::Space => {
                    mid_word = false;
                    if at_start && !merge {
                        continue;
                    }
                    let advance = font.glyph(' ').advance * scale;
                    if advance < cur.distance(end) {
                        cur = cur.advance_towards(end, advance);
                        at_start = false;
                    } else {
                        overflow = true;
                    }
                }
                Token::Cluster { text, last_in_word } => {
                    let glyphs: Vec<Glyph> = text.chars().map(|c| font.glyph(c)).collect();
                    let width: f64 = glyphs.iter().map(|g| g.advance * scale).sum();
                    let reserve = if last_in_word { 0.0 } else { hyphen_advance };
                    if width + reserve < cur.distance(end) {
                        for glyph in glyphs {
                            let next = cur.advance_towards(end, glyph.advance * scale);
                            placed.push(PlacedGlyph {
                                glyph,
                                pos: cur.to_position(),
                                next_pos: next.to_position(),
                                segment: cs,
                            });
                            cur = next;
                        }
                        at_start = false;
                        mid_word = !last_in_word;
                    } else {
                        if mid_word && !merge {
                            let next = cur.advance_towards(end, hyphen.advance * scale);
                            placed.push(PlacedGlyph {
                                glyph: hyphen.clone(),
                                pos: cur.to_position(),
                                next_pos: next.to_position(),
                                segment: cs,
                            });
                        }
                        cursor.rewind();
                        overflow = true;
                    }
                }
            }

            if overflow {
                seg_idx += 1;
                let Some(next_seg) = segments.get(seg_idx) else {
                    return (Some(cursor), placed);
                };
                cs = if merge { [cur.to_position(), next_seg[1]] } else { *next_seg };
                cur = Vec2::from(cs[0]);
                end = Vec2::from(cs[1]);
                at_start = true;
                mid_word = false;
            }
        }
    }
}
