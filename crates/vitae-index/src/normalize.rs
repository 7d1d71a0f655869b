//! Cleanup of raw extracted resume text before chunking.

const BULLETS: &[char] = &['•', '●', '▪', '◦', '◉'];
const DASHES: &[char] = &['‒', '–', '—', '―', '−'];
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{300}'..='\u{36f}';

/// Icon-font glyph names that PDF extraction leaves behind in contact lines.
const ICON_ARTIFACTS: &[(&str, &str)] = &[
    ("ap-arker-alt", "Location: "),
    ("/envelpe", " Email: "),
    ("phone-alt", " Phone: "),
];

/// Normalize extracted text into clean lines with `- ` bullets.
///
/// Bullet glyphs and unicode dashes become `-`, curly quotes become ASCII
/// quotes, trailing blanks are removed, runs of blank lines collapse to one
/// and icon-font artefacts are rewritten to readable labels. Letters and
/// digits from any script are kept; other non-ASCII symbols become spaces,
/// so the text tokenizes exactly as the raw input would.
///
/// # Examples
///
/// ```
/// use vitae_index::normalize::normalize;
///
/// let text = normalize("Skills\r\n•   Rust — Go   \r\n\r\n\r\n\r\nDone");
/// assert_eq!(text, "Skills\n- Rust - Go\n\nDone");
/// ```
pub fn normalize(raw: &str) -> String {
    let replaced: String = raw
        .replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            c if BULLETS.contains(&c) || DASHES.contains(&c) => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            c if c.is_ascii() || c.is_alphanumeric() || COMBINING_MARKS.contains(&c) => c,
            _ => ' ',
        })
        .collect();

    let mut cleaned = replaced;
    for (artifact, label) in ICON_ARTIFACTS {
        cleaned = cleaned.replace(artifact, label);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;
    for line in cleaned.split('\n') {
        let line = line.trim_end_matches([' ', '\t']);
        if line.is_empty() {
            blank_run += 1;
            if blank_run == 1 {
                lines.push(String::new());
            }
            continue;
        }
        blank_run = 0;
        match line.strip_prefix('-') {
            Some(rest) => lines.push(format!("- {}", rest.trim_start())),
            None => lines.push(line.to_string()),
        }
    }

    lines.join("\n").trim().to_string()
}
