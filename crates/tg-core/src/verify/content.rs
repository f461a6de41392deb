//! Line-level artifact content model
//!
//! Classifies every line as code, comment, dead, or blank so that pattern
//! checks scan live code only: a truncation limit inside a comment or a
//! provably-dead block is not a defect.

/// Classification of one source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Code,
    Comment,
    Dead,
    Blank,
}

#[derive(Debug, Clone)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    pub text: String,
    pub kind: LineKind,
}

enum DeadRegion {
    /// `#if 0` until the matching `#endif`
    PreprocessorBlock,
    /// An `if False:` style suite: lines indented deeper than the opener
    IndentSuite(usize),
}

/// Parsed artifact content
#[derive(Debug, Clone)]
pub struct ArtifactContent {
    lines: Vec<Line>,
}

impl ArtifactContent {
    /// Parse raw bytes. Content that is not text is a structural parse
    /// failure; the caller maps it to UNABLE_TO_VERIFY.
    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(data)
            .map_err(|_| "content is not valid UTF-8 text".to_string())?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut in_block_comment = false;
        let mut dead: Option<DeadRegion> = None;

        for (i, raw) in text.lines().enumerate() {
            let number = i + 1;
            let trimmed = raw.trim();
            let indent = raw.len() - raw.trim_start().len();

            if let Some(region) = &dead {
                match region {
                    DeadRegion::PreprocessorBlock => {
                        lines.push(Line {
                            number,
                            text: raw.to_string(),
                            kind: LineKind::Dead,
                        });
                        if trimmed.starts_with("#endif") {
                            dead = None;
                        }
                        continue;
                    }
                    DeadRegion::IndentSuite(base) => {
                        if trimmed.is_empty() || indent > *base {
                            lines.push(Line {
                                number,
                                text: raw.to_string(),
                                kind: if trimmed.is_empty() {
                                    LineKind::Blank
                                } else {
                                    LineKind::Dead
                                },
                            });
                            continue;
                        }
                        // Dedent ends the suite; classify this line normally.
                        dead = None;
                    }
                }
            }

            let kind = if in_block_comment {
                if trimmed.contains("*/") {
                    in_block_comment = false;
                }
                LineKind::Comment
            } else if trimmed.is_empty() {
                LineKind::Blank
            } else if trimmed.starts_with("#if 0") {
                dead = Some(DeadRegion::PreprocessorBlock);
                LineKind::Dead
            } else if is_dead_branch_opener(trimmed) {
                dead = Some(DeadRegion::IndentSuite(indent));
                LineKind::Dead
            } else if trimmed.starts_with('#') || trimmed.starts_with("//") {
                LineKind::Comment
            } else if trimmed.starts_with("/*") {
                if !trimmed.contains("*/") {
                    in_block_comment = true;
                }
                LineKind::Comment
            } else {
                LineKind::Code
            };

            lines.push(Line {
                number,
                text: raw.to_string(),
                kind,
            });
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn code_lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|l| l.kind == LineKind::Code)
    }

    pub fn code_line_count(&self) -> usize {
        self.code_lines().count()
    }
}

fn is_dead_branch_opener(trimmed: &str) -> bool {
    trimmed.starts_with("if False:")
        || trimmed.starts_with("if False :")
        || trimmed.starts_with("if false:")
        || trimmed.starts_with("if (false)")
        || trimmed.starts_with("if false {")
}
