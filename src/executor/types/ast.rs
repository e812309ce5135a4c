//! Abstract Syntax Tree node types
//!
//! A script is a list of sentences, a sentence is a list of words. Words are
//! never evaluated here: the compiler turns them into opcodes.

use serde::{Deserialize, Serialize};

/// Parsed script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub sentences: Vec<Sentence>,
}

/// One command invocation: the first word names the command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub words: Vec<Word>,
}

/// Word AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Word {
    /// Bare text, escapes already resolved
    Literal { v: String },
    /// `( ... )`
    Tuple { items: Vec<Word> },
    /// `{ ... }`, kept unevaluated along with its source text
    Block { script: Script, source: String },
    /// `[ ... ]`, evaluated in place
    Expression { script: Script },
    /// `"..."`, parts are joined as strings
    Str { parts: Vec<Word> },
    /// Adjacent morphemes joined as strings, e.g. `prefix$name`
    Compound { parts: Vec<Word> },
    /// `$name`, `${name}`, `$(a b)`, `$[expr]`, with optional `*` and selectors
    Substitution {
        levels: usize,
        expand: bool,
        source: Box<Word>,
        selectors: Vec<SelectorNode>,
    },
    /// Literal or tuple followed by selectors, e.g. `name(key)`
    Qualified {
        source: Box<Word>,
        selectors: Vec<SelectorNode>,
    },
}

/// Selector AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum SelectorNode {
    /// `[expr]`
    Index { script: Script },
    /// `(key ...)`
    Keys { items: Vec<Word> },
}

impl Script {
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}
