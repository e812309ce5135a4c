//! Runtime value types

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::ast::Script;
use crate::executor::command::Command;

/// Runtime value type
///
/// Values are immutable once built; containers share their items through `Rc`
/// so cloning a value never copies its contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Nil,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(Rc<str>),
    List(Rc<Vec<Val>>),
    Dict(Rc<HashMap<String, Val>>),
    /// Literal grouping, also used as an argument-splice marker by `$*`
    Tuple(Rc<Vec<Val>>),
    /// Unevaluated block of source
    Script(ScriptValue),
    /// First-class command reference
    Command(CommandValue),
    /// Value plus selectors applied at resolution time
    Qualified(Rc<QualifiedValue>),
}

/// Script value: parsed block plus the source it came from
#[derive(Clone)]
pub struct ScriptValue {
    pub script: Rc<Script>,
    pub source: Option<Rc<str>>,
}

/// Command value: compared by identity
#[derive(Clone)]
pub struct CommandValue(pub Rc<dyn Command>);

/// A selector applied to a value
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `[index]`
    Index(Val),
    /// `(key ...)`, applied left to right
    Keys(Vec<Val>),
}

/// Qualified value: `source` plus a selector chain
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedValue {
    pub source: Val,
    pub selectors: Vec<Selector>,
}

/* ===================== Constructors ===================== */

impl Val {
    pub fn tuple(items: Vec<Val>) -> Self {
        Val::Tuple(Rc::new(items))
    }

    pub fn list(items: Vec<Val>) -> Self {
        Val::List(Rc::new(items))
    }

    pub fn dict(entries: HashMap<String, Val>) -> Self {
        Val::Dict(Rc::new(entries))
    }

    pub fn script(script: Script, source: Option<&str>) -> Self {
        Val::Script(ScriptValue {
            script: Rc::new(script),
            source: source.map(Rc::from),
        })
    }

    pub fn command(command: Rc<dyn Command>) -> Self {
        Val::Command(CommandValue(command))
    }

    pub fn qualified(source: Val, selectors: Vec<Selector>) -> Self {
        Val::Qualified(Rc::new(QualifiedValue { source, selectors }))
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(Rc::from(s))
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(Rc::from(s))
    }
}

impl From<i64> for Val {
    fn from(n: i64) -> Self {
        Val::Int(n)
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Real(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

/* ===================== Conversions ===================== */

impl Val {
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Nil => "nil",
            Val::Bool(_) => "boolean",
            Val::Int(_) => "integer",
            Val::Real(_) => "real",
            Val::Str(_) => "string",
            Val::List(_) => "list",
            Val::Dict(_) => "dict",
            Val::Tuple(_) => "tuple",
            Val::Script(_) => "script",
            Val::Command(_) => "command",
            Val::Qualified(_) => "qualified",
        }
    }

    /// String representation, when the value has one
    ///
    /// Only scalars and scripts with known source convert to text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Val::Bool(b) => Some(b.to_string()),
            Val::Int(n) => Some(n.to_string()),
            Val::Real(n) => Some(format_real(*n)),
            Val::Str(s) => Some(s.to_string()),
            Val::Script(s) => s.source.as_ref().map(|src| src.to_string()),
            _ => None,
        }
    }

    /// Simple name (variable, constant, command, argument)
    pub fn as_name(&self) -> Option<String> {
        match self {
            Val::Bool(_) | Val::Int(_) | Val::Real(_) | Val::Str(_) => self.to_text(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            Val::Str(s) => match s.as_ref() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Val::Int(n) => Some(*n),
            Val::Str(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Numeric value normalized to `Int` or `Real`
    pub fn as_number(&self) -> Option<Val> {
        match self {
            Val::Int(_) | Val::Real(_) => Some(self.clone()),
            Val::Str(s) => parse_number(s),
            _ => None,
        }
    }

    /// Items of a list or tuple
    pub fn as_items(&self) -> Option<&[Val]> {
        match self {
            Val::List(items) | Val::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Val::Nil)
    }
}

/// Parse a numeric literal; words such as `inf` or `nan` are not numbers
pub fn parse_number(s: &str) -> Option<Val> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Val::Int(n));
    }
    if !s.chars().any(|c| c.is_ascii_digit()) || s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite()).map(Val::Real)
}

fn format_real(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/* ===================== Selection ===================== */

impl Val {
    /// Apply an indexed selector: lists, tuples and strings
    pub fn select_index(&self, index: &Val) -> Result<Val, String> {
        let i = index
            .as_int()
            .ok_or_else(|| format!("invalid integer \"{}\"", index))?;
        match self {
            Val::List(items) | Val::Tuple(items) => usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| format!("index out of range \"{}\"", i)),
            Val::Str(s) => usize::try_from(i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Val::from(c.to_string()))
                .ok_or_else(|| format!("index out of range \"{}\"", i)),
            _ => Err(format!("value of type {} is not index-selectable", self.type_name())),
        }
    }

    /// Apply a keyed selector: dictionaries
    pub fn select_key(&self, key: &Val) -> Result<Val, String> {
        match self {
            Val::Dict(entries) => {
                let name = key.as_name().ok_or_else(|| "invalid key".to_string())?;
                entries
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| format!("unknown key \"{}\"", name))
            }
            _ => Err(format!("value of type {} is not key-selectable", self.type_name())),
        }
    }
}

impl Selector {
    pub fn apply(&self, value: &Val) -> Result<Val, String> {
        match self {
            Selector::Index(index) => value.select_index(index),
            Selector::Keys(keys) => {
                let mut current = value.clone();
                for key in keys {
                    current = current.select_key(key)?;
                }
                Ok(current)
            }
        }
    }
}

impl QualifiedValue {
    /// Same source, one more selector
    pub fn with_selector(&self, selector: Selector) -> Val {
        let mut selectors = self.selectors.clone();
        selectors.push(selector);
        Val::qualified(self.source.clone(), selectors)
    }
}

/* ===================== Equality & Formatting ===================== */

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.script, &other.script) {
            return true;
        }
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => a == b,
            _ => self.script == other.script,
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Script({{{}}})", source),
            None => write!(f, "Script({:?})", self.script),
        }
    }
}

impl PartialEq for CommandValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Nil => write!(f, "nil"),
            Val::Bool(_) | Val::Int(_) | Val::Real(_) | Val::Str(_) => {
                write!(f, "{}", self.to_text().unwrap_or_default())
            }
            Val::List(items) => write!(f, "[list {}]", join_items(items)),
            Val::Tuple(items) => write!(f, "{}", join_items(items)),
            Val::Dict(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{} {}", k, entries[k]))
                    .collect();
                write!(f, "[dict ({})]", parts.join(" "))
            }
            Val::Script(s) => match &s.source {
                Some(source) => write!(f, "{{{}}}", source),
                None => write!(f, "{{...}}"),
            },
            Val::Command(_) => write!(f, "[command]"),
            Val::Qualified(q) => {
                write!(f, "{}", q.source)?;
                for selector in &q.selectors {
                    match selector {
                        Selector::Index(index) => write!(f, "[{}]", index)?,
                        Selector::Keys(keys) => {
                            let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                            write!(f, "({})", keys.join(" "))?
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn join_items(items: &[Val]) -> String {
    let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
    format!("({})", parts.join(" "))
}
