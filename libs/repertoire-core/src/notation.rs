//! Chess notation helpers.
//!
//! SAN comparison has to survive differences in how a rules engine and a
//! stored answer spell the same move (`Nge7` vs `Ne7`, `Nf3+` vs `Nf3`,
//! `0-0` vs `O-O`), so every comparison goes through [`normalize_san`].

use crate::types::Color;

/// Annotation glyphs with their display labels.
pub const ANNOTATIONS: &[(&str, &str)] = &[
    ("", "No annotation"),
    ("?", "? Poor"),
    ("?!", "?! Dubious"),
    ("!?", "!? Interesting"),
    ("!", "! Good"),
    ("!!", "!! Brilliant"),
    ("??", "?? Blunder"),
    ("=", "= Drawish"),
    ("∞", "∞ Unclear"),
    ("⩲", "⩲ White Slight"),
    ("⩱", "⩱ Black Slight"),
    ("±", "± White Moderate"),
    ("∓", "∓ Black Moderate"),
    ("+-", "+- White Decisive"),
    ("-+", "-+ Black Decisive"),
];

/// Display label for an annotation glyph.
pub fn annotation_label(glyph: &str) -> Option<&'static str> {
    ANNOTATIONS
        .iter()
        .find(|(g, _)| *g == glyph)
        .map(|(_, label)| *label)
}

/// Normalize a SAN string for comparison.
///
/// Strips check/mate markers and annotation glyphs, spells castling with
/// letters, writes promotions as `=Q`, and drops origin disambiguators from
/// piece moves. Unparseable input is returned stripped but otherwise verbatim.
/// Use [`normalize_san_among`] when the legal moves are known.
pub fn normalize_san(san: &str) -> String {
    let core = strip_suffixes(san);
    match canonical_san(core, false) {
        Some(normalized) => {
            if normalized != core {
                tracing::debug!(san, normalized = %normalized, "normalized SAN");
            }
            normalized
        }
        None => {
            tracing::warn!(san, "unrecognized SAN, comparing verbatim");
            core.to_string()
        }
    }
}

/// Normalize a SAN string but keep the origin disambiguator of piece moves.
pub fn normalize_san_strict(san: &str) -> String {
    let core = strip_suffixes(san);
    canonical_san(core, true).unwrap_or_else(|| core.to_string())
}

/// Normalize a SAN string against the legal moves of its position.
///
/// The origin disambiguator is dropped only when it is unnecessary, i.e. no
/// other legal move collapses to the same form. With `Nbd2` and `Nfd2` both
/// legal, each keeps its origin file.
pub fn normalize_san_among(san: &str, legal: &[String]) -> String {
    let collapsed = normalize_san(san);
    let rivals = legal
        .iter()
        .filter(|m| canonical_san(strip_suffixes(m), false).as_deref() == Some(collapsed.as_str()))
        .count();
    if rivals > 1 {
        normalize_san_strict(san)
    } else {
        collapsed
    }
}

/// Whether two SAN strings denote the same move after normalization.
pub fn same_move(a: &str, b: &str) -> bool {
    normalize_san(a) == normalize_san(b)
}

fn strip_suffixes(san: &str) -> &str {
    let mut s = san.trim();
    loop {
        let next = s
            .strip_suffix("e.p.")
            .unwrap_or(s)
            .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
            .trim_end();
        if next == s {
            return s;
        }
        s = next;
    }
}

fn canonical_san(s: &str, keep_origin: bool) -> Option<String> {
    if s.is_empty() || !s.is_ascii() {
        return None;
    }

    let castle = s.replace('0', "O");
    if castle == "O-O" || castle == "O-O-O" {
        return Some(castle);
    }

    let piece = s.as_bytes()[0] as char;
    if matches!(piece, 'N' | 'B' | 'R' | 'Q' | 'K') {
        piece_move(piece, &s[1..], keep_origin)
    } else {
        pawn_move(s)
    }
}

fn piece_move(piece: char, rest: &str, keep_origin: bool) -> Option<String> {
    if rest.len() < 2 {
        return None;
    }
    let (head, dest) = rest.split_at(rest.len() - 2);
    if !is_square(dest) {
        return None;
    }

    let (disambiguator, capture) = match head.strip_suffix('x') {
        Some(d) => (d, true),
        None => (head, false),
    };
    if !is_disambiguator(disambiguator) {
        return None;
    }

    let origin = if keep_origin { disambiguator } else { "" };
    Some(format!("{piece}{origin}{}{dest}", if capture { "x" } else { "" }))
}

fn pawn_move(s: &str) -> Option<String> {
    let (body, promotion) = match s.chars().last() {
        Some(p @ ('N' | 'B' | 'R' | 'Q')) => {
            let body = &s[..s.len() - 1];
            (body.strip_suffix('=').unwrap_or(body), Some(p))
        }
        _ => (s, None),
    };

    let valid = match body.len() {
        2 => is_square(body),
        4 => is_file(body.as_bytes()[0]) && body.as_bytes()[1] == b'x' && is_square(&body[2..]),
        _ => false,
    };
    if !valid {
        return None;
    }

    Some(match promotion {
        Some(p) => format!("{body}={p}"),
        None => body.to_string(),
    })
}

fn is_file(b: u8) -> bool {
    (b'a'..=b'h').contains(&b)
}

fn is_rank(b: u8) -> bool {
    (b'1'..=b'8').contains(&b)
}

/// Whether `s` is a board square such as `e4`.
pub fn is_square(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 2 && is_file(b[0]) && is_rank(b[1])
}

fn is_disambiguator(s: &str) -> bool {
    let b = s.as_bytes();
    match b.len() {
        0 => true,
        1 => is_file(b[0]) || is_rank(b[0]),
        2 => is_square(s),
        _ => false,
    }
}

/// Split a comma/whitespace separated SAN list.
///
/// Move-number tokens (`1.`, `23...`) and bare numerals are dropped, and a
/// number glued to a move (`1.e4`) is stripped.
pub fn parse_san_list(raw: &str) -> Vec<String> {
    let mut moves: Vec<String> = Vec::new();
    for token in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = strip_move_number(token);
        if token.is_empty() || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !moves.iter().any(|m| m == token) {
            moves.push(token.to_string());
        }
    }
    moves
}

fn strip_move_number(token: &str) -> &str {
    let digits = token.len() - token.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return token;
    }
    let after_digits = &token[digits..];
    let dots = after_digits.trim_start_matches('.');
    if dots.len() == after_digits.len() {
        // No dot follows the digits: a bare numeral or something like `0-0`.
        return token;
    }
    dots
}

/// Full-move number of a 0-based ply.
pub fn move_number(ply: usize) -> u32 {
    (ply / 2 + 1) as u32
}

/// 0-based ply index of the first player move for a full-move number.
///
/// White answers at ply `2N - 2`, black at ply `2N - 1`.
pub fn start_index(start_move: u32, color: Color) -> usize {
    let ply = start_move.max(1) as usize * 2;
    match color {
        Color::White => ply - 2,
        Color::Black => ply - 1,
    }
}

/// `1.e4`, `1...e5` style label for a ply, with its annotation appended.
pub fn move_verbose(ply: usize, san: &str, annotation: &str) -> String {
    let dots = match Color::of_ply(ply) {
        Color::White => ".",
        Color::Black => "...",
    };
    format!("{}{}{}{}", move_number(ply), dots, san, annotation)
}

/// Join SAN moves into a numbered mainline string.
pub fn mainline<'a>(sans: impl IntoIterator<Item = &'a str>) -> String {
    sans.into_iter()
        .enumerate()
        .map(|(ply, san)| {
            if ply % 2 == 0 {
                format!("{}.{}", move_number(ply), san)
            } else {
                san.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
