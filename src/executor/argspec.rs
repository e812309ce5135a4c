//! Argument specifications
//!
//! An argspec is written as a block, a tuple or a single name:
//!
//! - `name`: required
//! - `?name`: optional, left unbound when missing
//! - `(?name default)`: optional with a default value
//! - `*name`: remainder, bound to a tuple of the extra arguments (at most one)
//!
//! Optional arguments are filled left to right before the remainder gets
//! anything.

use std::collections::HashSet;

use super::errors;
use super::types::{EvalResult, ResultCode, Script, Val, Word};

#[derive(Debug, Clone, PartialEq)]
enum ArgKind {
    Required,
    Optional(Option<Val>),
    Remainder,
}

#[derive(Debug, Clone, PartialEq)]
struct Argument {
    name: String,
    kind: ArgKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argspec {
    args: Vec<Argument>,
    required: usize,
    optional: usize,
    remainder: bool,
    /// Value the argspec was built from
    value: Val,
}

impl Argspec {
    /// Build from a block, tuple, list or single name
    pub fn from_value(value: &Val) -> Result<Self, EvalResult> {
        let specs: Vec<Val> = match value {
            Val::Script(script) => script_values(&script.script)?,
            Val::Tuple(items) | Val::List(items) => items.as_ref().clone(),
            _ => vec![value.clone()],
        };

        let mut args = Vec::with_capacity(specs.len());
        let mut names = HashSet::new();
        let (mut required, mut optional, mut remainder) = (0, 0, false);
        for spec in &specs {
            let arg = parse_argument(spec)?;
            if !names.insert(arg.name.clone()) {
                return Err(EvalResult::error(format!("duplicate argument \"{}\"", arg.name)));
            }
            match arg.kind {
                ArgKind::Required => required += 1,
                ArgKind::Optional(_) => optional += 1,
                ArgKind::Remainder if remainder => {
                    return Err(EvalResult::error("only one remainder argument is allowed"))
                }
                ArgKind::Remainder => remainder = true,
            }
            args.push(arg);
        }

        Ok(Argspec {
            args,
            required,
            optional,
            remainder,
            value: value.clone(),
        })
    }

    pub fn value(&self) -> &Val {
        &self.value
    }

    /// Number of declared arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Only required arguments
    pub fn is_fixed(&self) -> bool {
        self.optional == 0 && !self.remainder
    }

    pub fn nb_required(&self) -> usize {
        self.required
    }

    /// Whether `args[skip..]` fits the spec
    pub fn check_arity(&self, args: &[Val], skip: usize) -> bool {
        let n = args.len().saturating_sub(skip);
        n >= self.required && (self.remainder || n <= self.required + self.optional)
    }

    /// Bind `args[skip..]` through `bind`, stopping at the first failure
    pub fn apply_arguments(
        &self,
        args: &[Val],
        skip: usize,
        bind: &mut dyn FnMut(&str, Val) -> EvalResult,
    ) -> EvalResult {
        let values = args.get(skip..).unwrap_or(&[]);
        let extra = values.len().saturating_sub(self.required);
        let mut optional_left = extra.min(self.optional);
        let rest_len = extra - optional_left;

        let mut values = values.iter();
        for arg in &self.args {
            let value = match &arg.kind {
                ArgKind::Required => values.next().cloned(),
                ArgKind::Optional(default) => {
                    if optional_left > 0 {
                        optional_left -= 1;
                        values.next().cloned()
                    } else {
                        default.clone()
                    }
                }
                ArgKind::Remainder => Some(Val::tuple(values.by_ref().take(rest_len).cloned().collect())),
            };
            if let Some(value) = value {
                let result = bind(&arg.name, value);
                if result.code != ResultCode::Ok {
                    return result;
                }
            }
        }
        EvalResult::nil()
    }

    /// Usage string, e.g. `a ?b? ?c ...?`
    pub fn usage(&self, skip: usize) -> String {
        self.args
            .iter()
            .skip(skip)
            .map(|arg| match arg.kind {
                ArgKind::Required => arg.name.clone(),
                ArgKind::Optional(_) => format!("?{}?", arg.name),
                ArgKind::Remainder => format!("?{} ...?", arg.name),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_argument(spec: &Val) -> Result<Argument, EvalResult> {
    match spec {
        Val::Tuple(items) | Val::List(items) => match items.as_slice() {
            [name, default] => {
                let name = name.as_name().ok_or_else(|| errors::invalid_name("argument"))?;
                let name = name.strip_prefix('?').unwrap_or(&name);
                if name.is_empty() {
                    return Err(errors::invalid_name("argument"));
                }
                Ok(Argument {
                    name: name.to_string(),
                    kind: ArgKind::Optional(Some(default.clone())),
                })
            }
            _ => Err(EvalResult::error("invalid argument specifier")),
        },
        _ => {
            let text = spec.as_name().ok_or_else(|| errors::invalid_name("argument"))?;
            let (name, kind) = if let Some(name) = text.strip_prefix('?') {
                (name, ArgKind::Optional(None))
            } else if let Some(name) = text.strip_prefix('*') {
                (name, ArgKind::Remainder)
            } else {
                (text.as_str(), ArgKind::Required)
            };
            if name.is_empty() {
                return Err(errors::invalid_name("argument"));
            }
            Ok(Argument {
                name: name.to_string(),
                kind,
            })
        }
    }
}

/// Static values of the words in a block argspec
fn script_values(script: &Script) -> Result<Vec<Val>, EvalResult> {
    script
        .sentences
        .iter()
        .flat_map(|sentence| sentence.words.iter())
        .map(word_value)
        .collect()
}

fn word_value(word: &Word) -> Result<Val, EvalResult> {
    match word {
        Word::Literal { v } => Ok(Val::from(v.as_str())),
        Word::Tuple { items } => Ok(Val::tuple(items.iter().map(word_value).collect::<Result<_, _>>()?)),
        _ => Err(EvalResult::error("invalid argument specifier")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn spec(source: &str) -> Argspec {
        let script = parse(source).expect("parse failed");
        Argspec::from_value(&Val::script(script, Some(source))).expect("invalid argspec")
    }

    fn bind_all(spec: &Argspec, args: &[Val]) -> Vec<(String, Val)> {
        let mut bound = Vec::new();
        let result = spec.apply_arguments(args, 0, &mut |name, value| {
            bound.push((name.to_string(), value));
            EvalResult::nil()
        });
        assert_eq!(result.code, ResultCode::Ok);
        bound
    }

    #[test]
    fn test_usage() {
        assert_eq!(spec("a ?b (?c 1) *d").usage(0), "a ?b? ?c? ?d ...?");
        assert_eq!(spec("a b").usage(1), "b");
    }

    #[test]
    fn test_arity() {
        let s = spec("a ?b");
        assert!(!s.check_arity(&[], 0));
        assert!(s.check_arity(&[Val::from("x")], 0));
        assert!(s.check_arity(&[Val::from("x"), Val::from("y")], 0));
        assert!(!s.check_arity(&[Val::from("x"), Val::from("y"), Val::from("z")], 0));
        assert!(s.check_arity(&[Val::from("cmd"), Val::from("x")], 1));
        assert!(spec("a").is_fixed());
        assert!(!spec("*rest").is_fixed());
    }

    #[test]
    fn test_apply_with_defaults_and_remainder() {
        let s = spec("a (?b def) *rest");
        let bound = bind_all(&s, &[Val::from("1")]);
        assert_eq!(
            bound,
            vec![
                ("a".to_string(), Val::from("1")),
                ("b".to_string(), Val::from("def")),
                ("rest".to_string(), Val::tuple(vec![])),
            ]
        );

        let bound = bind_all(&s, &[Val::from("1"), Val::from("2"), Val::from("3"), Val::from("4")]);
        assert_eq!(bound[1], ("b".to_string(), Val::from("2")));
        assert_eq!(
            bound[2],
            ("rest".to_string(), Val::tuple(vec![Val::from("3"), Val::from("4")]))
        );
    }

    #[test]
    fn test_missing_optional_is_unbound() {
        let bound = bind_all(&spec("a ?b"), &[Val::from("1")]);
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn test_invalid_specs() {
        let err = Argspec::from_value(&Val::tuple(vec![Val::from("*a"), Val::from("*b")]))
            .expect_err("two remainders");
        assert_eq!(err.message().as_deref(), Some("only one remainder argument is allowed"));

        let err = Argspec::from_value(&Val::tuple(vec![Val::from("a"), Val::from("a")]))
            .expect_err("duplicate");
        assert_eq!(err.message().as_deref(), Some("duplicate argument \"a\""));

        let err = Argspec::from_value(&Val::from("?")).expect_err("empty name");
        assert_eq!(err.message().as_deref(), Some("invalid argument name"));
    }
}
