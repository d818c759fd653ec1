use serde::{Deserialize, Serialize};

/// Leading glyphs that mark a section header in narrative reports.
///
/// Matched against the first character of the raw line, before trimming.
pub const HEADER_MARKERS: [char; 13] = [
    '📋', '🏛', '🚦', '💰', '👥', '📊', '🔧', '🎯', '⚠', '💡', '📚', '🗺', '🔑',
];

/// Bullet glyphs recognised at the start of a trimmed line.
pub const BULLET_MARKERS: [char; 2] = ['•', '-'];

/// A key-value key must be shorter than this many characters.
pub const MAX_KEY_CHARS: usize = 50;

/// Rendering treatment of one report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedLine {
    /// Bullet point with its marker stripped.
    Bullet {
        /// Text after the marker.
        text: String,
    },
    /// `key: value` pair.
    KeyValue {
        /// Text before the first colon, verbatim.
        key: String,
        /// Text after the first colon, trimmed.
        value: String,
    },
    /// Anything else.
    Paragraph {
        /// The trimmed line.
        text: String,
    },
}

/// Titled group of classified lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Trimmed header line, marker included.
    pub title: String,
    /// Lines in input order.
    pub lines: Vec<ClassifiedLine>,
}

/// Splits a narrative summary into titled, classified sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportParser;

impl ReportParser {
    /// Parses `text` into sections. Missing or empty text yields no sections.
    ///
    /// Lines before the first header are dropped, as are blank lines and
    /// `===` separators.
    #[must_use]
    pub fn parse(text: Option<&str>) -> Vec<ReportSection> {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Vec::new();
        };
        let mut sections = Vec::new();
        let mut current: Option<ReportSection> = None;
        for line in text.lines() {
            if is_header(line) {
                sections.extend(current.take());
                current = Some(ReportSection {
                    title: line.trim().to_string(),
                    lines: Vec::new(),
                });
            } else if is_separator(line) {
                continue;
            } else if let Some(section) = current.as_mut() {
                if let Some(classified) = classify_line(line) {
                    section.lines.push(classified);
                }
            }
        }
        sections.extend(current);
        sections
    }
}

/// True when `line` starts with one of [`HEADER_MARKERS`].
#[must_use]
pub fn is_header(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|first| HEADER_MARKERS.contains(&first))
}

/// True for `===`-style rules (three or more `=` at line start).
#[must_use]
pub fn is_separator(line: &str) -> bool {
    line.chars().take_while(|c| *c == '=').count() >= 3
}

/// Classifies one line; blank lines yield `None`.
#[must_use]
pub fn classify_line(line: &str) -> Option<ClassifiedLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix(&BULLET_MARKERS[..]) {
        return Some(ClassifiedLine::Bullet {
            text: rest.trim_start().to_string(),
        });
    }
    if let Some((key, value)) = trimmed.split_once(':') {
        if key.chars().count() < MAX_KEY_CHARS {
            return Some(ClassifiedLine::KeyValue {
                key: key.to_string(),
                value: value.trim().to_string(),
            });
        }
    }
    Some(ClassifiedLine::Paragraph {
        text: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &str, value: &str) -> ClassifiedLine {
        ClassifiedLine::KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn empty_input_has_no_sections() {
        assert!(ReportParser::parse(None).is_empty());
        assert!(ReportParser::parse(Some("")).is_empty());
        assert!(ReportParser::parse(Some("no header here\n• nor here")).is_empty());
    }

    #[test]
    fn classifies_overview_section() {
        let sections =
            ReportParser::parse(Some("📋 Overview\nName: India\n• Point one\nJust a sentence."));
        assert_eq!(
            sections,
            vec![ReportSection {
                title: "📋 Overview".into(),
                lines: vec![
                    kv("Name", "India"),
                    ClassifiedLine::Bullet {
                        text: "Point one".into()
                    },
                    ClassifiedLine::Paragraph {
                        text: "Just a sentence.".into()
                    },
                ],
            }]
        );
    }

    #[test]
    fn separators_belong_to_no_section() {
        let text = "🚦 Traffic\nCongestion Level: 68.2%\n=====\n💰 Economy\nGDP Growth Rate: 6.8%";
        let sections = ReportParser::parse(Some(text));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "🚦 Traffic");
        assert_eq!(sections[0].lines, vec![kv("Congestion Level", "68.2%")]);
        assert_eq!(sections[1].title, "💰 Economy");
        assert_eq!(sections[1].lines, vec![kv("GDP Growth Rate", "6.8%")]);
    }

    #[test]
    fn value_keeps_later_colons() {
        assert_eq!(
            classify_line("  Peak Hours: 08:00-10:00, 17:00-20:00 "),
            Some(kv("Peak Hours", "08:00-10:00, 17:00-20:00"))
        );
    }

    #[test]
    fn long_prefix_is_a_paragraph() {
        let key = "k".repeat(MAX_KEY_CHARS);
        let line = format!("{key}: value");
        assert_eq!(
            classify_line(&line),
            Some(ClassifiedLine::Paragraph { text: line.clone() })
        );
        let short = format!("{}: value", "k".repeat(MAX_KEY_CHARS - 1));
        assert!(matches!(
            classify_line(&short),
            Some(ClassifiedLine::KeyValue { .. })
        ));
    }

    #[test]
    fn bullets_win_over_key_values() {
        assert_eq!(
            classify_line("• LOW BUDGET: May limit reach"),
            Some(ClassifiedLine::Bullet {
                text: "LOW BUDGET: May limit reach".into()
            })
        );
        assert_eq!(
            classify_line("-   spaced"),
            Some(ClassifiedLine::Bullet {
                text: "spaced".into()
            })
        );
        assert_eq!(classify_line("   "), None);
    }

    #[test]
    fn header_needs_marker_at_line_start() {
        assert!(is_header("⚠️  RISK ASSESSMENT"));
        assert!(is_header("🏛️ Governance"));
        assert!(!is_header("  📋 indented"));
        assert!(!is_header("Overview 📋"));
        assert!(is_separator("==="));
        assert!(!is_separator("== not quite"));
        assert!(!is_separator(" ==== indented"));
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "📊 Impact\nCitizen Satisfaction:\n  • Score: 71.0%\n\n🎯 Next\nPilot in 3 districts";
        assert_eq!(ReportParser::parse(Some(text)), ReportParser::parse(Some(text)));
    }
}
