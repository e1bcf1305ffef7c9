// Surface parser for generated Rust source.
//
// Parses a token stream (from the lexer) into the item surface of the
// emitted module: every `impl` block with its trait, type argument, self
// type, `Output` binding, and function signatures. Other items and function
// bodies are consumed as balanced token trees. Uses chumsky combinators.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns the impl surface plus any parse errors (non-fatal).
// Failure modes: unbalanced delimiters or malformed impl headers produce
//   `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::lexer::{Span, Token};

/// One parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// `self`
    SelfValue,
    /// `&self`
    SelfRef,
    /// `name: Type`
    Named { name: String, ty: String },
}

/// A function inside an impl block.
#[derive(Debug, Clone, PartialEq)]
pub struct FnItem {
    pub is_pub: bool,
    pub name: String,
    pub params: Vec<Param>,
    pub ret: String,
    /// Span of the body including its braces.
    pub body: SimpleSpan,
}

impl FnItem {
    /// Name of the first non-receiver parameter, if any.
    pub fn rhs_param(&self) -> Option<&str> {
        self.params.iter().find_map(|p| match p {
            Param::Named { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// An `impl` block header and its functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplItem {
    pub trait_name: Option<String>,
    pub type_arg: Option<String>,
    pub self_ty: String,
    /// `type Output = ...;` binding, if present.
    pub output: Option<String>,
    pub fns: Vec<FnItem>,
    pub span: SimpleSpan,
}

/// Result of parsing: impl surface plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub impls: Option<Vec<ImplItem>>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
    /// The lexed tokens, kept for body inspection.
    pub tokens: Vec<(Token, Span)>,
}

impl ParseResult {
    /// Tokens strictly inside `span`.
    pub fn tokens_within(&self, span: SimpleSpan) -> impl Iterator<Item = &(Token, Span)> {
        self.tokens
            .iter()
            .filter(move |(_, s)| s.start > span.start() && s.end < span.end())
    }
}

/// Parse generated Rust source. Lexes then parses.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();
    let tokens = lex_result.tokens.clone();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = surface_parser(source);
    let (impls, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        impls,
        errors: all_errors,
        tokens,
    }
}

// ── Parser builder ──

#[derive(Debug, Clone)]
enum Member {
    Assoc(String, String),
    Fn(FnItem),
}

fn surface_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Vec<ImplItem>, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        source[span.start()..span.end()].to_string()
    });

    // ── Token trees: balanced groups or single non-delimiter tokens ──

    let tree = recursive(|tree| {
        let braces = tree
            .clone()
            .repeated()
            .delimited_by(just(Token::LBrace), just(Token::RBrace));
        let parens = tree
            .clone()
            .repeated()
            .delimited_by(just(Token::LParen), just(Token::RParen));
        let brackets = tree
            .repeated()
            .delimited_by(just(Token::LBracket), just(Token::RBracket));
        let leaf = none_of([
            Token::LBrace,
            Token::RBrace,
            Token::LParen,
            Token::RParen,
            Token::LBracket,
            Token::RBracket,
        ])
        .ignored();
        choice((braces, parens, brackets, leaf))
    });

    // ── Types: paths and tuples ──

    let ty = recursive(|ty| {
        let segment = ident.clone().or(just(Token::SelfType).to("Self".to_string()));
        let path = segment
            .separated_by(just(Token::PathSep))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|segments| segments.join("::"));
        let tuple = ty
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<String>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|items| format!("({})", items.join(", ")));
        path.or(tuple)
    });

    // ── Function items ──

    let param = choice((
        just(Token::Amp)
            .ignore_then(just(Token::SelfValue))
            .to(Param::SelfRef),
        just(Token::SelfValue).to(Param::SelfValue),
        ident
            .clone()
            .then_ignore(just(Token::Colon))
            .then(ty.clone())
            .map(|(name, ty)| Param::Named { name, ty }),
    ));

    let body = tree
        .clone()
        .repeated()
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .map_with(|_, e| {
            let span: SimpleSpan = e.span();
            span
        });

    let fn_item = just(Token::Pub)
        .or_not()
        .map(|p| p.is_some())
        .then_ignore(just(Token::Fn))
        .then(ident.clone())
        .then(
            param
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then_ignore(just(Token::Arrow))
        .then(ty.clone())
        .then(body)
        .map(|((((is_pub, name), params), ret), body)| FnItem {
            is_pub,
            name,
            params,
            ret,
            body,
        });

    // ── Impl blocks ──

    let assoc_type = just(Token::Type)
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Equals))
        .then(ty.clone())
        .then_ignore(just(Token::Semi))
        .map(|(name, ty)| Member::Assoc(name, ty));

    let member = assoc_type.or(fn_item.map(Member::Fn));

    let impl_item = just(Token::Impl)
        .ignore_then(ident.clone())
        .then(ty.delimited_by(just(Token::Lt), just(Token::Gt)).or_not())
        .then(just(Token::For).ignore_then(ident).or_not())
        .then(
            member
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|(((first, type_arg), for_ty), members), e| {
            let (trait_name, self_ty) = match for_ty {
                Some(self_ty) => (Some(first), self_ty),
                None => (None, first),
            };
            let mut output = None;
            let mut fns = Vec::new();
            for m in members {
                match m {
                    Member::Assoc(name, ty) if name == "Output" => output = Some(ty),
                    Member::Assoc(..) => {}
                    Member::Fn(f) => fns.push(f),
                }
            }
            ImplItem {
                trait_name,
                type_arg,
                self_ty,
                output,
                fns,
                span: e.span(),
            }
        });

    // ── Module: impl blocks among other token trees ──

    impl_item
        .map(Some)
        .or(tree.to(None))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|items| items.into_iter().flatten().collect())
}

// ── Tests ──
