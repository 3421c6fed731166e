use std::iter::Peekable;
use std::str::CharIndices;

use tabrus_core::types::Token;

/// Streaming tokenizer over a borrowed text.
///
/// Yields word runs and punctuation runs; whitespace is skipped but stays
/// recoverable from the byte offsets of neighbouring tokens.
pub struct Tokenizer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

pub fn tokenize(text: &str) -> Tokenizer<'_> { Tokenizer { text, chars: text.char_indices().peekable() } }

fn is_word_char(c: char) -> bool {
    // U+0300..U+036F: combining marks, e.g. stress accents in dictionary text
    c.is_alphanumeric() || ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Characters that stay inside a word when flanked by word characters.
fn is_joiner(c: char) -> bool { matches!(c, '-' | '\'' | '’' | 'ʼ') }

impl<'a> Tokenizer<'a> {
    fn word_follows(&self, at: usize) -> bool { self.text[at..].chars().next().is_some_and(is_word_char) }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let (start, first) = loop {
            let (i, c) = self.chars.next()?;
            if !c.is_whitespace() { break (i, c); }
        };
        let mut end = start + first.len_utf8();
        if is_word_char(first) {
            while let Some(&(i, c)) = self.chars.peek() {
                let next_end = i + c.len_utf8();
                if is_word_char(c) || (is_joiner(c) && self.word_follows(next_end)) {
                    self.chars.next();
                    end = next_end;
                } else {
                    break;
                }
            }
        } else {
            while let Some(&(i, c)) = self.chars.peek() {
                if c.is_whitespace() || is_word_char(c) { break; }
                self.chars.next();
                end = i + c.len_utf8();
            }
        }
        let text = &self.text[start..end];
        Some(Token { text: text.to_string(), is_word: text.chars().any(char::is_alphabetic), start, end })
    }
}

/// Rebuild a text from its tokens, substituting each token through `replace`
/// and copying the original inter-token spacing verbatim.
pub fn render<'t, F, R>(original: &str, tokens: &'t [Token], mut replace: F) -> String
where
    F: FnMut(&'t Token) -> R,
    R: AsRef<str>,
{
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0usize;
    for token in tokens {
        if token.start > cursor { out.push_str(&original[cursor..token.start]); }
        out.push_str(replace(token).as_ref());
        cursor = token.end;
    }
    if cursor < original.len() { out.push_str(&original[cursor..]); }
    out
}
