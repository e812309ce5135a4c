//! PEST-based parser for Cadence scripts
//!
//! Produces the `Script` AST consumed by the compiler. Blocks keep their
//! source text so that script values can be printed and re-parsed.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::executor::types::{Script, SelectorNode, Sentence, Word};


/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/script.pest"]
struct ScriptParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Error)]
pub enum ParseError {
    /// Grammar mismatch, with 1-based line and column
    #[error("{message}")]
    Syntax {
        message: String,
        line: usize,
        col: usize,
    },
    /// Parse tree did not have the expected shape
    #[error("{0}")]
    Build(String),
}

impl ParseError {
    /// Position of a syntax error
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Syntax { line, col, .. } => Some((*line, *col)),
            ParseError::Build(_) => None,
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, col) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        ParseError::Syntax {
            message: err.to_string(),
            line,
            col,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Parse Cadence source into a script
pub fn parse(source: &str) -> ParseResult<Script> {
    let mut pairs = ScriptParser::parse(Rule::script, source)?;
    let script = next_pair(&mut pairs, "script")?;
    let body = next_pair(&mut script.into_inner(), "script body")?;
    build_body(body)
}

/* ===================== AST Builder ===================== */

fn next_pair<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    what: &str,
) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::Build(format!("missing {}", what)))
}

fn build_body(pair: Pair<Rule>) -> ParseResult<Script> {
    let sentences = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::sentence)
        .map(build_sentence)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Script { sentences })
}

fn build_sentence(pair: Pair<Rule>) -> ParseResult<Sentence> {
    let words = pair
        .into_inner()
        .map(build_word)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Sentence { words })
}

fn build_words(pair: Pair<Rule>) -> ParseResult<Vec<Word>> {
    pair.into_inner().map(build_word).collect()
}

fn build_word(pair: Pair<Rule>) -> ParseResult<Word> {
    let inner = next_pair(&mut pair.into_inner(), "word")?;
    match inner.as_rule() {
        Rule::string => build_string(inner),
        Rule::compound => {
            let mut parts = inner
                .into_inner()
                .map(build_morpheme)
                .collect::<ParseResult<Vec<_>>>()?;
            if parts.len() == 1 {
                Ok(parts.remove(0))
            } else {
                Ok(Word::Compound { parts })
            }
        }
        rule => Err(ParseError::Build(format!("unexpected word: {:?}", rule))),
    }
}

fn build_morpheme(pair: Pair<Rule>) -> ParseResult<Word> {
    match pair.as_rule() {
        Rule::literal => Ok(Word::Literal {
            v: unescape(pair.as_str()),
        }),
        Rule::tuple => Ok(Word::Tuple {
            items: build_words(pair)?,
        }),
        Rule::block => {
            let body = next_pair(&mut pair.into_inner(), "block body")?;
            let source = body.as_str().to_string();
            let inner = next_pair(&mut body.into_inner(), "block script")?;
            Ok(Word::Block {
                script: build_body(inner)?,
                source,
            })
        }
        Rule::expression => {
            let body = next_pair(&mut pair.into_inner(), "expression body")?;
            Ok(Word::Expression {
                script: build_body(body)?,
            })
        }
        Rule::substitution => build_substitution(pair),
        Rule::qualified => {
            let mut inner = pair.into_inner();
            let source = build_morpheme(next_pair(&mut inner, "qualified source")?)?;
            let selectors = inner.map(build_selector).collect::<ParseResult<Vec<_>>>()?;
            Ok(Word::Qualified {
                source: Box::new(source),
                selectors,
            })
        }
        rule => Err(ParseError::Build(format!("unexpected morpheme: {:?}", rule))),
    }
}

fn build_string(pair: Pair<Rule>) -> ParseResult<Word> {
    let parts = pair
        .into_inner()
        .map(|part| match part.as_rule() {
            Rule::str_text => Ok(Word::Literal {
                v: unescape(part.as_str()),
            }),
            _ => build_morpheme(part),
        })
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Word::Str { parts })
}

fn build_substitution(pair: Pair<Rule>) -> ParseResult<Word> {
    let mut levels = 0;
    let mut expand = false;
    let mut source = None;
    let mut selectors = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::dollar => levels += 1,
            Rule::expand => expand = true,
            Rule::var_name => {
                source = Some(Word::Literal {
                    v: part.as_str().to_string(),
                })
            }
            Rule::braced_name => {
                let text = part.as_str();
                source = Some(Word::Literal {
                    v: text[1..text.len() - 1].to_string(),
                })
            }
            Rule::tuple | Rule::expression => source = Some(build_morpheme(part)?),
            Rule::index_selector | Rule::keys_selector => selectors.push(build_selector(part)?),
            rule => {
                return Err(ParseError::Build(format!(
                    "unexpected substitution part: {:?}",
                    rule
                )))
            }
        }
    }

    let source = source.ok_or_else(|| ParseError::Build("missing substitution source".into()))?;
    Ok(Word::Substitution {
        levels,
        expand,
        source: Box::new(source),
        selectors,
    })
}

fn build_selector(pair: Pair<Rule>) -> ParseResult<SelectorNode> {
    match pair.as_rule() {
        Rule::index_selector => {
            let body = next_pair(&mut pair.into_inner(), "index")?;
            Ok(SelectorNode::Index {
                script: build_body(body)?,
            })
        }
        Rule::keys_selector => Ok(SelectorNode::Keys {
            items: build_words(pair)?,
        }),
        rule => Err(ParseError::Build(format!("unexpected selector: {:?}", rule))),
    }
}

/// Resolve backslash escapes
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
