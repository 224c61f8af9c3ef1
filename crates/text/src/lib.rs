pub mod font;
pub mod hyphenation;
pub mod layout;
pub mod segments;
pub mod text;

pub use font::{BoxFont, Font, FontError, Glyph, TtfFont};
pub use hyphenation::{Hyphenator, NoHyphenation, PatternHyphenator};
pub use layout::{AutoSizeConfig, TextLayout, binary_search};
pub use segments::{Segment, get_writable_segments, line_intersect};
pub use text::{PlacedGlyph, Text, TextCursor, Token};
