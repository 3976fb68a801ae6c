//! Balanced literal extraction.
//!
//! The one place in the compiler where true lexical state tracking is
//! mandatory. [`extract_balanced`] pulls a syntactically complete object or
//! array literal out of raw source text, keeping a nesting depth that is only
//! affected by brackets seen *outside* strings and comments. Everything else
//! in the compiler is allowed to be a conservative regex rewrite; balanced
//! matching is not regex territory.
//!
//! Template literals are skipped as one opaque string token — interpolated
//! expressions are not recursed into. A literal whose interpolation carries
//! unbalanced braces can defeat the scan; that limitation is deliberate and
//! must not be "fixed" (it would change observable bundle output).

#[derive(Debug, Clone, Copy, PartialEq)]
enum LexState {
    Normal,
    SingleQuote,
    DoubleQuote,
    Template,
    LineComment,
    BlockComment,
}

/// Extract the substring spanning a balanced `open`..`close` literal,
/// starting at the first `open` at or after `from_index` (byte offset) that
/// sits outside any string or comment. Returns `None` if the source ends
/// before the depth returns to zero.
pub fn extract_balanced(
    source: &str,
    from_index: usize,
    open: char,
    close: char,
) -> Option<String> {
    let bytes = source.as_bytes();
    let open = open as u8;
    let close = close as u8;

    let mut state = LexState::Normal;
    let mut depth: usize = 0;
    let mut start: Option<usize> = None;
    let mut i = from_index.min(bytes.len());

    while i < bytes.len() {
        let c = bytes[i];
        match state {
            LexState::Normal => {
                match c {
                    b'\'' => state = LexState::SingleQuote,
                    b'"' => state = LexState::DoubleQuote,
                    b'`' => state = LexState::Template,
                    b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                        state = LexState::LineComment;
                        i += 1;
                    }
                    b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                        state = LexState::BlockComment;
                        i += 1;
                    }
                    c if c == open => {
                        if start.is_none() {
                            start = Some(i);
                        }
                        depth += 1;
                    }
                    c if c == close && start.is_some() => {
                        depth -= 1;
                        if depth == 0 {
                            let s = start.unwrap();
                            return Some(source[s..=i].to_string());
                        }
                    }
                    _ => {}
                }
            }
            LexState::SingleQuote => match c {
                b'\\' => i += 1,
                b'\'' => state = LexState::Normal,
                _ => {}
            },
            LexState::DoubleQuote => match c {
                b'\\' => i += 1,
                b'"' => state = LexState::Normal,
                _ => {}
            },
            LexState::Template => match c {
                b'\\' => i += 1,
                b'`' => state = LexState::Normal,
                _ => {}
            },
            LexState::LineComment => {
                if c == b'\n' {
                    state = LexState::Normal;
                }
            }
            LexState::BlockComment => {
                if c == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = LexState::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    None
}
