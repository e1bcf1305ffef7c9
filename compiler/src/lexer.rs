// Lexer for generated Rust source.
//
// Tokenizes the subset of Rust the emitter produces (items, impl blocks,
// arithmetic expressions, attributes, comments) so the emitted artifact can
// be checked structurally. Uses the `logos` crate for DFA-based lexing.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters produce `LexError`; lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Rust token types used by generated code.
///
/// Keywords and symbols are matched as fixed strings. Identifiers carry no
/// value; use the span to retrieve the text from the source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+|//[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("impl")]
    Impl,
    #[token("for")]
    For,
    #[token("fn")]
    Fn,
    #[token("pub")]
    Pub,
    #[token("type")]
    Type,
    #[token("self")]
    SelfValue,
    #[token("Self")]
    SelfType,
    #[token("struct")]
    Struct,
    #[token("trait")]
    Trait,
    #[token("use")]
    Use,
    #[token("const")]
    Const,
    #[token("where")]
    Where,
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("else")]
    Else,

    // ── Symbols ──
    #[token("->")]
    Arrow,
    #[token("::")]
    PathSep,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("#")]
    Hash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // ── Literals ──
    /// Float literal: needs a fractional part or an exponent.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    FloatLit(f64),

    /// Integer literal.
    #[regex(r"[0-9]+", parse_int)]
    IntLit(u64),

    /// String literal with escapes kept verbatim.
    #[regex(r#""([^"\\]|\\.)*""#)]
    StrLit,

    // ── Identifier ──
    //
    // Placed after keywords: logos prioritises fixed `#[token]` matches over
    // regex for the same length, so `impl` matches Impl, not Ident.
    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Token {
    pub fn is_open_delim(&self) -> bool {
        matches!(self, Token::LParen | Token::LBrace | Token::LBracket)
    }

    pub fn is_close_delim(&self) -> bool {
        matches!(self, Token::RParen | Token::RBrace | Token::RBracket)
    }

    /// The closing delimiter matching an opening one.
    pub fn closer(&self) -> Option<Token> {
        match self {
            Token::LParen => Some(Token::RParen),
            Token::LBrace => Some(Token::RBrace),
            Token::LBracket => Some(Token::RBracket),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Impl => write!(f, "impl"),
            Token::For => write!(f, "for"),
            Token::Fn => write!(f, "fn"),
            Token::Pub => write!(f, "pub"),
            Token::Type => write!(f, "type"),
            Token::SelfValue => write!(f, "self"),
            Token::SelfType => write!(f, "Self"),
            Token::Struct => write!(f, "struct"),
            Token::Trait => write!(f, "trait"),
            Token::Use => write!(f, "use"),
            Token::Const => write!(f, "const"),
            Token::Where => write!(f, "where"),
            Token::Let => write!(f, "let"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Arrow => write!(f, "->"),
            Token::PathSep => write!(f, "::"),
            Token::Colon => write!(f, ":"),
            Token::Semi => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Equals => write!(f, "="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Bang => write!(f, "!"),
            Token::Hash => write!(f, "#"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::FloatLit(v) => write!(f, "{v:?}"),
            Token::IntLit(v) => write!(f, "{v}"),
            Token::StrLit => write!(f, "<string>"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn parse_float(lex: &mut logos::Lexer<'_, Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_int(lex: &mut logos::Lexer<'_, Token>) -> Option<u64> {
    lex.slice().parse().ok()
}

// ── Public API ──

/// Lex generated Rust source into tokens.
///
/// Returns all successfully parsed tokens together with any errors for
/// unrecognised characters. Lexing is non-fatal: errors are collected and
/// the lexer continues past bad characters.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected character: {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: lex and assert no errors, return token list.
    fn lex_ok(source: &str) -> Vec<Token> {
        let result = lex(source);
        assert!(
            result.errors.is_empty(),
            "unexpected lex errors: {:?}",
            result.errors
        );
        result.tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords() {
        let tokens = lex_ok("impl for fn pub type self Self struct trait use const where let if else");
        assert_eq!(
            tokens,
            vec![
                Token::Impl,
                Token::For,
                Token::Fn,
                Token::Pub,
                Token::Type,
                Token::SelfValue,
                Token::SelfType,
                Token::Struct,
                Token::Trait,
                Token::Use,
                Token::Const,
                Token::Where,
                Token::Let,
                Token::If,
                Token::Else,
            ]
        );
    }

    #[test]
    fn keyword_vs_ident() {
        // `implement` and `self_` are identifiers.
        let tokens = lex_ok("impl implement self self_");
        assert_eq!(
            tokens,
            vec![Token::Impl, Token::Ident, Token::SelfValue, Token::Ident]
        );
    }

    #[test]
    fn longest_symbol_wins() {
        let tokens = lex_ok("-> - :: : > <");
        assert_eq!(
            tokens,
            vec![
                Token::Arrow,
                Token::Minus,
                Token::PathSep,
                Token::Colon,
                Token::Gt,
                Token::Lt
            ]
        );
    }

    #[test]
    fn float_and_int_literals() {
        let tokens = lex_ok("2.0 0.0 1e-9 2.5E+3 2");
        assert_eq!(
            tokens,
            vec![
                Token::FloatLit(2.0),
                Token::FloatLit(0.0),
                Token::FloatLit(1e-9),
                Token::FloatLit(2500.0),
                Token::IntLit(2),
            ]
        );
    }

    #[test]
    fn field_access_is_not_a_float() {
        let tokens = lex_ok("self.a15 * r.a2");
        assert_eq!(
            tokens,
            vec![
                Token::SelfValue,
                Token::Dot,
                Token::Ident,
                Token::Star,
                Token::Ident,
                Token::Dot,
                Token::Ident,
            ]
        );
    }

    #[test]
    fn comments_and_strings() {
        let tokens = lex_ok("// header 1 2 3\nassert!(x, \"norm is zero\");");
        assert_eq!(
            tokens,
            vec![
                Token::Ident,
                Token::Bang,
                Token::LParen,
                Token::Ident,
                Token::Comma,
                Token::StrLit,
                Token::RParen,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let result = lex("fn neg");
        assert_eq!(result.tokens[1].1, Span { start: 3, end: 6 });
    }

    #[test]
    fn unknown_character_is_reported() {
        let result = lex("fn $x");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].span, Span { start: 3, end: 4 });
        assert_eq!(result.tokens.len(), 2);
    }

    #[test]
    fn delimiter_helpers() {
        assert!(Token::LBrace.is_open_delim());
        assert!(Token::RBracket.is_close_delim());
        assert_eq!(Token::LParen.closer(), Some(Token::RParen));
        assert_eq!(Token::Ident.closer(), None);
    }
}
