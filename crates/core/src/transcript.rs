//! One agent's own utterances and their `Point i:` rendering.

use std::fmt::{self, Display, Formatter};

const POINT_PREFIX: &str = "Point ";

/// The ordered utterances of one agent, starting with its stance.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Transcript {
    points: Vec<String>,
}

impl Transcript {
    /// Starts a transcript with the agent's stance.
    #[inline]
    pub fn new(stance: impl Into<String>) -> Self {
        Self {
            points: vec![stance.into()],
        }
    }

    /// Appends an utterance.
    #[inline]
    pub fn push(&mut self, point: impl Into<String>) {
        self.points.push(point.into());
    }

    /// Returns the utterances in order.
    #[inline]
    pub fn points(&self) -> &[String] {
        &self.points
    }

    /// Returns the number of utterances.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Joins all utterances with single spaces, as one block of text.
    #[inline]
    pub fn joined(&self) -> String {
        self.points.join(" ")
    }
}

impl Display for Transcript {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format_transcript(&self.points))
    }
}

/// Renders points as `Point 1: ...` lines joined by newlines.
pub fn format_transcript<S: AsRef<str>>(points: &[S]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(idx, point)| format!("{POINT_PREFIX}{}: {}", idx + 1, point.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recovers the points from a block made by [`format_transcript`].
///
/// A line that does not start with the next expected label is treated as
/// a continuation of the previous point, so multi-line points survive.
pub fn parse_transcript(block: &str) -> Vec<String> {
    let mut points: Vec<String> = Vec::new();
    if block.is_empty() {
        return points;
    }
    for line in block.split('\n') {
        let label = format!("{POINT_PREFIX}{}: ", points.len() + 1);
        match line.strip_prefix(&label) {
            Some(point) => points.push(point.to_owned()),
            None => match points.last_mut() {
                Some(last) => {
                    last.push('\n');
                    last.push_str(line);
                }
                None => points.push(line.to_owned()),
            },
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let mut transcript = Transcript::new("Cats are better pets.");
        transcript.push("Cats clean themselves.");
        assert_eq!(
            transcript.to_string(),
            "Point 1: Cats are better pets.\nPoint 2: Cats clean themselves."
        );
        assert_eq!(
            transcript.joined(),
            "Cats are better pets. Cats clean themselves."
        );
        assert_eq!(format_transcript::<&str>(&[]), "");
    }

    #[test]
    fn test_parse_recovers_points() {
        let points = [
            "Dogs are loyal.",
            "A dog will guard your home.\nCats will not.",
            "",
            "Point 2: quoted labels stay inside a point.",
        ];
        let block = format_transcript(&points);
        assert_eq!(parse_transcript(&block), points);
        assert!(parse_transcript("").is_empty());
    }
}
