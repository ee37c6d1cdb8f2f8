//! Inline reasoning extraction for models that interleave `<think>`
//! blocks with their primary output.
//!
//! Some reasoning models deliver thinking on a dedicated wire field;
//! others embed it inline between `<think>` and `</think>` tags. The
//! filter separates the two channels and must cope with tags split
//! across chunk boundaries, so it holds back any tail that could be
//! the start of a marker until the next chunk resolves it.

/// A classified span of streamed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredPiece {
    Text(String),
    Reasoning(String),
}

/// Stateful splitter of inline `<think>` blocks.
#[derive(Debug, Default)]
pub struct ThinkTagFilter {
    in_reasoning: bool,
    carry: String,
}

impl ThinkTagFilter {
    const OPEN: &'static str = "<think>";
    const CLOSE: &'static str = "</think>";

    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of content, returning the spans that can be
    /// classified so far. A partial marker at the end of the chunk is
    /// retained until more input arrives.
    pub fn push(&mut self, chunk: &str) -> Vec<FilteredPiece> {
        self.carry.push_str(chunk);
        let mut pieces = Vec::new();
        loop {
            let marker = if self.in_reasoning {
                Self::CLOSE
            } else {
                Self::OPEN
            };
            match self.carry.find(marker) {
                Some(at) => {
                    if at > 0 {
                        let span: String = self.carry.drain(..at).collect();
                        pieces.push(self.classify(span));
                    }
                    self.carry.drain(..marker.len());
                    self.in_reasoning = !self.in_reasoning;
                }
                None => {
                    let keep = partial_marker_len(&self.carry, marker);
                    let emit = self.carry.len() - keep;
                    if emit > 0 {
                        let span: String = self.carry.drain(..emit).collect();
                        pieces.push(self.classify(span));
                    }
                    break;
                }
            }
        }
        pieces
    }

    /// Flush any held-back partial marker once the stream ends. A tail
    /// that never completed into a marker is literal content.
    pub fn finish(&mut self) -> Option<FilteredPiece> {
        if self.carry.is_empty() {
            None
        } else {
            let span = std::mem::take(&mut self.carry);
            Some(self.classify(span))
        }
    }

    fn classify(&self, span: String) -> FilteredPiece {
        if self.in_reasoning {
            FilteredPiece::Reasoning(span)
        } else {
            FilteredPiece::Text(span)
        }
    }
}

/// Length of the longest suffix of `s` that is a proper prefix of
/// `marker`. Markers are ASCII, so suffix offsets land on char
/// boundaries as long as the suffix itself matches.
fn partial_marker_len(s: &str, marker: &str) -> usize {
    let max = marker.len().saturating_sub(1).min(s.len());
    for len in (1..=max).rev() {
        if s.is_char_boundary(s.len() - len) && marker.starts_with(&s[s.len() - len..]) {
            return len;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FilteredPiece {
        FilteredPiece::Text(s.to_string())
    }

    fn reasoning(s: &str) -> FilteredPiece {
        FilteredPiece::Reasoning(s.to_string())
    }

    #[test]
    fn test_plain_text_passes_through() {
        let mut filter = ThinkTagFilter::new();
        assert_eq!(filter.push("<!DOCTYPE html>"), vec![text("<!DOCTYPE html>")]);
        assert!(filter.finish().is_none());
    }

    #[test]
    fn test_think_block_in_one_chunk() {
        let mut filter = ThinkTagFilter::new();
        let pieces = filter.push("<think>plan the maze</think><!DOCTYPE html>");
        assert_eq!(
            pieces,
            vec![reasoning("plan the maze"), text("<!DOCTYPE html>")]
        );
    }

    #[test]
    fn test_open_tag_split_across_chunks() {
        let mut filter = ThinkTagFilter::new();
        let first = filter.push("hello <th");
        // "<th" could become "<think>", so only "hello " is released.
        assert_eq!(first, vec![text("hello ")]);
        let second = filter.push("ink>deep thought</think>done");
        assert_eq!(second, vec![reasoning("deep thought"), text("done")]);
    }

    #[test]
    fn test_close_tag_split_across_chunks() {
        let mut filter = ThinkTagFilter::new();
        filter.push("<think>a");
        let pieces = filter.push("b</th");
        assert_eq!(pieces, vec![reasoning("b")]);
        assert_eq!(filter.push("ink>c"), vec![text("c")]);
    }

    #[test]
    fn test_reasoning_flushed_as_it_streams() {
        let mut filter = ThinkTagFilter::new();
        filter.push("<think>");
        assert_eq!(filter.push("step one, "), vec![reasoning("step one, ")]);
        assert_eq!(filter.push("step two"), vec![reasoning("step two")]);
    }

    #[test]
    fn test_lone_angle_bracket_eventually_emitted() {
        let mut filter = ThinkTagFilter::new();
        assert_eq!(filter.push("a < b"), vec![text("a < b")]);
        // "<" at the very end is held back...
        assert_eq!(filter.push("x <"), vec![text("x ")]);
        // ...and released once the next chunk rules out a marker.
        assert_eq!(filter.push("5"), vec![text("<5")]);
    }

    #[test]
    fn test_finish_flushes_held_tail() {
        let mut filter = ThinkTagFilter::new();
        assert_eq!(filter.push("end <thi"), vec![text("end ")]);
        assert_eq!(filter.finish(), Some(text("<thi")));
    }

    #[test]
    fn test_multiple_think_blocks() {
        let mut filter = ThinkTagFilter::new();
        let pieces = filter.push("<think>a</think>x<think>b</think>y");
        assert_eq!(
            pieces,
            vec![reasoning("a"), text("x"), reasoning("b"), text("y")]
        );
    }
}
