use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{instrument, warn};

use super::{Extraction, TextExtractor};

/// Runs the `tesseract` command line tool and reads its tsv output, which carries a confidence
/// for every recognized word.
pub struct TesseractExtractor {
    languages: String,
}

impl TesseractExtractor {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }

    async fn run(&self, image: &Path) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(image)
            .args(["stdout", "-l", &self.languages, "tsv"])
            .output()
            .await?;
        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    #[instrument(skip(self))]
    async fn extract(&self, image: &Path) -> Extraction {
        match self.run(image).await {
            Ok(tsv) => parse_tsv(&tsv),
            Err(e) => {
                warn!("Text extraction failed {e:?}");
                Extraction::default()
            }
        }
    }
}

const WORD_LEVEL: &str = "5";

/// Rebuilds text lines out of word rows and averages their confidences. Columns are `level
/// page_num block_num par_num line_num word_num left top width height conf text`.
pub fn parse_tsv(tsv: &str) -> Extraction {
    let mut lines: Vec<String> = vec![];
    let mut current_line = None;
    let mut confidence_sum = 0.;
    let mut words = 0usize;

    for row in tsv.lines().skip(1) {
        let columns = row.split('\t').collect::<Vec<_>>();
        let [level, page, block, paragraph, line, _, _, _, _, _, confidence, text] =
            columns[..]
        else {
            continue;
        };
        let text = text.trim();
        if level != WORD_LEVEL || text.is_empty() {
            continue;
        }
        let Ok(confidence) = confidence.parse::<f64>() else {
            continue;
        };
        if confidence < 0. {
            continue;
        }

        let line_key = (page, block, paragraph, line);
        match lines.last_mut() {
            Some(last) if current_line == Some(line_key) => {
                last.push(' ');
                last.push_str(text);
            }
            _ => {
                lines.push(text.to_string());
                current_line = Some(line_key);
            }
        }
        confidence_sum += confidence;
        words += 1;
    }

    let confidence = (words > 0).then(|| confidence_sum / words as f64 / 100.);
    Extraction::new(lines.join("\n"), confidence)
}

#[cfg(test)]
mod tests {
    use super::parse_tsv;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, line: u32, word: u32, confidence: &str, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t{word}\t0\t0\t10\t10\t{confidence}\t{text}")
    }

    #[test]
    fn test_words_are_joined_into_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t".into(),
            "4\t1\t1\t1\t1\t0\t0\t0\t100\t10\t-1\t".into(),
            word(1, 1, 1, "90", "cargo"),
            word(1, 1, 2, "80", "test"),
            word(1, 2, 1, "70", "passed"),
            word(2, 1, 1, "60", "done"),
        ]
        .join("\n");

        let extraction = parse_tsv(&tsv);
        assert_eq!(extraction.text, "cargo test\npassed\ndone");
        assert!((extraction.confidence.unwrap() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_broken_rows() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 1, "95", " "),
            word(1, 1, 2, "-1", "ghost"),
            word(1, 1, 3, "abc", "broken"),
            "5\t1\t1".into(),
        ]
        .join("\n");

        let extraction = parse_tsv(&tsv);
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.confidence, None);
        assert_eq!(parse_tsv(""), Default::default());
    }
}
