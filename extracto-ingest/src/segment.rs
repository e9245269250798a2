//! Line/block segmenter: split a statement's lines into per-transaction blocks.
//!
//! States: `Idle` (header noise, discarded) -> `InBlock` (collecting) and back
//! to `InBlock` whenever a start line closes the previous block.

use std::mem;

use regex::Regex;
use tracing::debug;

/// Lines believed to belong to one transaction. `lines[0]` is the start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBlock {
    lines: Vec<String>,
}

impl TransactionBlock {
    fn open(start: &str) -> Self {
        Self {
            lines: vec![start.to_string()],
        }
    }

    /// The line that triggered this block.
    pub fn start(&self) -> &str {
        &self.lines[0]
    }

    /// Lines after the start line.
    pub fn body(&self) -> &[String] {
        &self.lines[1..]
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_body(mut self) -> Vec<String> {
        self.lines.remove(0);
        self.lines
    }

    /// All lines joined with single spaces.
    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug, Default)]
enum SegmentState {
    #[default]
    Idle,
    InBlock(TransactionBlock),
}

/// Streaming segmenter; feed lines, then `finish`.
pub struct Segmenter<P> {
    is_start: P,
    keep_bare_starts: bool,
    state: SegmentState,
    blocks: Vec<TransactionBlock>,
    discarded: usize,
}

impl<P: Fn(&str) -> bool> Segmenter<P> {
    pub fn new(is_start: P) -> Self {
        Self {
            is_start,
            keep_bare_starts: false,
            state: SegmentState::Idle,
            blocks: Vec::new(),
            discarded: 0,
        }
    }

    /// Emit blocks that consist of the start line alone. Needed by layouts
    /// whose start line already carries the whole transaction.
    pub fn keep_bare_starts(mut self) -> Self {
        self.keep_bare_starts = true;
        self
    }

    pub fn feed(&mut self, line: &str) {
        if (self.is_start)(line) {
            self.close();
            self.state = SegmentState::InBlock(TransactionBlock::open(line));
            return;
        }
        match &mut self.state {
            SegmentState::Idle => self.discarded += 1,
            SegmentState::InBlock(block) => block.lines.push(line.to_string()),
        }
    }

    fn close(&mut self) {
        if let SegmentState::InBlock(block) = mem::take(&mut self.state) {
            if block.lines.len() > 1 || self.keep_bare_starts {
                self.blocks.push(block);
            }
        }
    }

    pub fn finish(mut self) -> Vec<TransactionBlock> {
        self.close();
        debug!(
            blocks = self.blocks.len(),
            discarded = self.discarded,
            "segmented statement"
        );
        self.blocks
    }
}

/// Segment `lines` with a start-of-record predicate.
pub fn segment<S, P>(lines: &[S], is_start: P) -> Vec<TransactionBlock>
where
    S: AsRef<str>,
    P: Fn(&str) -> bool,
{
    lines
        .iter()
        .fold(Segmenter::new(is_start), |mut seg, line| {
            seg.feed(line.as_ref());
            seg
        })
        .finish()
}

/// Same as [`segment`] but start lines alone still form a block.
pub fn segment_keeping_bare_starts<S, P>(lines: &[S], is_start: P) -> Vec<TransactionBlock>
where
    S: AsRef<str>,
    P: Fn(&str) -> bool,
{
    lines
        .iter()
        .fold(Segmenter::new(is_start).keep_bare_starts(), |mut seg, line| {
            seg.feed(line.as_ref());
            seg
        })
        .finish()
}

/// Terminal amount located inside a block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLine {
    /// The amount token as printed.
    pub raw: String,
    /// Index of the body line the amount was found on.
    pub index: usize,
}

/// Search `body` from its last line backward for an amount.
///
/// `whole` matches a line that is only the amount; `tail` must capture
/// `(description, amount)` for a line ending in an amount, in which case the
/// line is rewritten to the description part.
pub fn find_value_line(body: &mut [String], whole: &Regex, tail: &Regex) -> Option<ValueLine> {
    for index in (0..body.len()).rev() {
        if whole.is_match(&body[index]) {
            return Some(ValueLine {
                raw: body[index].clone(),
                index,
            });
        }
        let split = tail.captures(&body[index]).and_then(|caps| {
            Some((
                caps.get(1)?.as_str().trim().to_string(),
                caps.get(2)?.as_str().to_string(),
            ))
        });
        if let Some((description, raw)) = split {
            body[index] = description;
            return Some(ValueLine { raw, index });
        }
    }
    None
}
