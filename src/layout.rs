//! Layout Module
//!
//! Text measurement for the standard Helvetica faces and greedy word
//! wrapping. Widths are the AFM advance widths in 1/1000 em for the printable
//! ASCII range.

use pdf_writer::Name;

/// Width used for characters without a table entry.
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// WinAnsi code points 0x80..0x9F: character, byte, Helvetica width,
/// Helvetica-Bold width.
#[rustfmt::skip]
const WIN_ANSI_EXTENSIONS: [(char, u8, u16, u16); 27] = [
    ('\u{20AC}', 0x80, 556, 556),   // Euro
    ('\u{201A}', 0x82, 222, 278),   // quotesinglbase
    ('\u{0192}', 0x83, 556, 556),   // florin
    ('\u{201E}', 0x84, 333, 500),   // quotedblbase
    ('\u{2026}', 0x85, 1000, 1000), // ellipsis
    ('\u{2020}', 0x86, 556, 556),   // dagger
    ('\u{2021}', 0x87, 556, 556),   // daggerdbl
    ('\u{02C6}', 0x88, 333, 333),   // circumflex
    ('\u{2030}', 0x89, 1000, 1000), // perthousand
    ('\u{0160}', 0x8A, 667, 667),   // Scaron
    ('\u{2039}', 0x8B, 333, 333),   // guilsinglleft
    ('\u{0152}', 0x8C, 1000, 1000), // OE
    ('\u{017D}', 0x8E, 611, 611),   // Zcaron
    ('\u{2018}', 0x91, 222, 278),   // quoteleft
    ('\u{2019}', 0x92, 222, 278),   // quoteright
    ('\u{201C}', 0x93, 333, 500),   // quotedblleft
    ('\u{201D}', 0x94, 333, 500),   // quotedblright
    ('\u{2022}', 0x95, 350, 350),   // bullet
    ('\u{2013}', 0x96, 556, 556),   // endash
    ('\u{2014}', 0x97, 1000, 1000), // emdash
    ('\u{02DC}', 0x98, 333, 333),   // tilde
    ('\u{2122}', 0x99, 1000, 1000), // trademark
    ('\u{0161}', 0x9A, 500, 556),   // scaron
    ('\u{203A}', 0x9B, 333, 333),   // guilsinglright
    ('\u{0153}', 0x9C, 944, 944),   // oe
    ('\u{017E}', 0x9E, 500, 500),   // zcaron
    ('\u{0178}', 0x9F, 667, 667),   // Ydieresis
];

fn win_ansi_extension(c: char) -> Option<&'static (char, u8, u16, u16)> {
    WIN_ANSI_EXTENSIONS.iter().find(|entry| entry.0 == c)
}

/// The base-14 faces used by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    /// Name of the font in each page's resource dictionary.
    pub fn resource_name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
            Font::Oblique => Name(b"F3"),
        }
    }

    pub fn base_font(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"Helvetica"),
            Font::Bold => Name(b"Helvetica-Bold"),
            Font::Oblique => Name(b"Helvetica-Oblique"),
        }
    }

    fn char_width(self, c: char) -> u16 {
        let table = match self {
            Font::Regular | Font::Oblique => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => match (win_ansi_extension(c), self) {
                (Some(&(_, _, _, bold)), Font::Bold) => bold,
                (Some(&(_, _, regular, _)), _) => regular,
                (None, _) => FALLBACK_WIDTH,
            },
        }
    }

    /// Width of `text` at `size` points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }
}

/// Encodes `text` as WinAnsi bytes. Latin-1 characters map to themselves,
/// typographic punctuation to the 0x80..0x9F block, anything else becomes
/// `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ if c.is_whitespace() => b' ',
            _ => win_ansi_extension(c).map_or(b'?', |entry| entry.1),
        })
        .collect()
}

/// Splits `text` into lines no wider than `max_width`.
///
/// Whitespace runs, line breaks included, collapse into single spaces.
/// Words wider than a full line are broken between characters.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = font.text_width(word, size);

        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_word(word, font, size, max_width);
            // The tail keeps accepting words.
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current_width = font.text_width(&last, size);
                current = last;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(c);
        if !piece.is_empty() && font.text_width(&candidate, size) > max_width {
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        } else {
            piece = candidate;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_with_afm_widths() {
        // H(722) + i(222)
        assert!((Font::Regular.text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        // H(722) + i(278)
        assert!((Font::Bold.text_width("Hi", 10.0) - 10.0).abs() < 1e-4);
        assert_eq!(Font::Oblique.text_width("abc", 12.0), Font::Regular.text_width("abc", 12.0));
    }

    #[test]
    fn encodes_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("Café"), b"Caf\xE9".to_vec());
        assert_eq!(encode_win_ansi("a\u{2192}b"), b"a?b".to_vec());
        assert_eq!(encode_win_ansi("\u{1F512}"), b"?".to_vec());
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
    }

    #[test]
    fn encodes_typographic_punctuation_into_the_high_block() {
        assert_eq!(
            encode_win_ansi("\u{2018}a\u{2019} \u{201C}b\u{201D} \u{2013} \u{2014} \u{2026} \u{2022} \u{20AC}"),
            b"\x91a\x92 \x93b\x94 \x96 \x97 \x85 \x95 \x80".to_vec()
        );
    }

    #[test]
    fn measures_typographic_punctuation_with_afm_widths() {
        // emdash(1000) + quoteright(222)
        assert!((Font::Regular.text_width("\u{2014}\u{2019}", 10.0) - 12.22).abs() < 1e-4);
        // quotedblleft(500) + bullet(350)
        assert!((Font::Bold.text_width("\u{201C}\u{2022}", 10.0) - 8.5).abs() < 1e-4);
        assert_eq!(Font::Oblique.char_width('\u{2026}'), 1000);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let text = "the quick brown fox jumps over the lazy dog";
        let width = Font::Regular.text_width("the quick brown", 10.0) + 0.01;
        let lines = wrap_text(text, Font::Regular, 10.0, width);
        assert_eq!(lines[0], "the quick brown");
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 10.0) <= width);
        }
    }

    #[test]
    fn collapses_whitespace_and_newlines() {
        let lines = wrap_text("a\n\n  b\tc", Font::Regular, 10.0, 500.0);
        assert_eq!(lines, vec!["a b c".to_string()]);
        assert!(wrap_text("   ", Font::Regular, 10.0, 500.0).is_empty());
    }

    #[test]
    fn breaks_words_longer_than_a_line() {
        let word = "x".repeat(40);
        let width = Font::Regular.text_width("xxxxxxxxxx", 10.0) + 0.01;
        let lines = wrap_text(&format!("{word} tail"), Font::Regular, 10.0, width);
        assert_eq!(lines.len(), 5);
        assert!(lines[..4].iter().all(|l| l.len() == 10));
        assert_eq!(lines[4], "tail");
    }
}
