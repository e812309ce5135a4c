//! Compiler
//!
//! Turns parsed scripts and runtime values into programs. Every sentence
//! becomes `OpenFrame`, one group of opcodes per word, then
//! `EvaluateSentence`. Expressions are compiled inline into the enclosing
//! program, so a command that suspends inside `[ ... ]` suspends the program
//! right at that word.

use crate::executor::types::{OpCode, Program, Script, SelectorNode, Sentence, Val, Word};

#[derive(Debug, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Compiler
    }

    /* ===================== Entry Points ===================== */

    pub fn compile_script(&self, script: &Script) -> Program {
        let mut program = Program::new();
        for sentence in &script.sentences {
            self.emit_sentence(&mut program, sentence);
        }
        program
    }

    /// Tuple body: its items form one sentence
    pub fn compile_tuple(&self, items: &[Val]) -> Program {
        self.compile_args(items)
    }

    /// Single sentence `cmd arg`, e.g. a guard applied to a value
    pub fn compile_pair(&self, command: Val, arg: Val) -> Program {
        self.compile_args(&[command, arg])
    }

    /// Single sentence made of already evaluated words
    pub fn compile_args(&self, args: &[Val]) -> Program {
        let mut program = Program::new();
        if args.is_empty() {
            return program;
        }
        program.push(OpCode::OpenFrame);
        for arg in args {
            program.push(OpCode::PushConstant(arg.clone()));
        }
        program.push(OpCode::EvaluateSentence);
        program
    }

    /// Program whose result is `value`
    pub fn compile_constant(&self, value: Val) -> Program {
        let mut program = Program::new();
        program.push(OpCode::PushConstant(value));
        program
    }

    /* ===================== Words ===================== */

    fn emit_sentence(&self, program: &mut Program, sentence: &Sentence) {
        program.push(OpCode::OpenFrame);
        for word in &sentence.words {
            self.emit_word(program, word);
        }
        program.push(OpCode::EvaluateSentence);
    }

    fn emit_word(&self, program: &mut Program, word: &Word) {
        match word {
            Word::Literal { v } => program.push(OpCode::PushConstant(Val::from(v.as_str()))),

            Word::Tuple { items } => {
                program.push(OpCode::OpenFrame);
                for item in items {
                    self.emit_word(program, item);
                }
                program.push(OpCode::CloseFrame);
            }

            Word::Block { script, source } => {
                program.push(OpCode::PushConstant(Val::script(script.clone(), Some(source))));
            }

            Word::Expression { script } => self.emit_expression(program, script),

            Word::Str { parts } | Word::Compound { parts } => {
                program.push(OpCode::OpenFrame);
                for part in parts {
                    self.emit_word(program, part);
                }
                program.push(OpCode::CloseFrame);
                program.push(OpCode::JoinStrings);
            }

            Word::Substitution {
                levels,
                expand,
                source,
                selectors,
            } => {
                self.emit_word(program, source);
                // `$[expr]` already yields a value: the first `$` is the expression itself
                let resolutions = match source.as_ref() {
                    Word::Expression { .. } => levels.saturating_sub(1),
                    _ => *levels,
                };
                for _ in 0..resolutions {
                    program.push(OpCode::ResolveValue);
                }
                self.emit_selectors(program, selectors);
                if *expand {
                    program.push(OpCode::ExpandValue);
                }
            }

            Word::Qualified { source, selectors } => {
                self.emit_word(program, source);
                program.push(OpCode::SetSource);
                self.emit_selectors(program, selectors);
            }
        }
    }

    fn emit_expression(&self, program: &mut Program, script: &Script) {
        if script.is_empty() {
            program.push(OpCode::PushNil);
            return;
        }
        for sentence in &script.sentences {
            self.emit_sentence(program, sentence);
        }
        program.push(OpCode::PushResult);
    }

    fn emit_selectors(&self, program: &mut Program, selectors: &[SelectorNode]) {
        for selector in selectors {
            match selector {
                SelectorNode::Index { script } => {
                    self.emit_expression(program, script);
                    program.push(OpCode::SelectIndex);
                }
                SelectorNode::Keys { items } => {
                    program.push(OpCode::OpenFrame);
                    for item in items {
                        self.emit_word(program, item);
                    }
                    program.push(OpCode::CloseFrame);
                    program.push(OpCode::SelectKeys);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn compile(source: &str) -> Program {
        let script = parse(source).expect("parse failed");
        Compiler::new().compile_script(&script)
    }

    #[test]
    fn test_compile_sentence() {
        let program = compile("idem value");
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("idem")),
                OpCode::PushConstant(Val::from("value")),
                OpCode::EvaluateSentence,
            ]
        );
    }

    #[test]
    fn test_compile_substitution() {
        let program = compile("idem $$name");
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("idem")),
                OpCode::PushConstant(Val::from("name")),
                OpCode::ResolveValue,
                OpCode::ResolveValue,
                OpCode::EvaluateSentence,
            ]
        );
    }

    #[test]
    fn test_compile_inline_expression() {
        let program = compile("idem [yield]");
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("idem")),
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("yield")),
                OpCode::EvaluateSentence,
                OpCode::PushResult,
                OpCode::EvaluateSentence,
            ]
        );
    }

    #[test]
    fn test_compile_expanded_tuple_substitution() {
        let program = compile("cmd $*(a b)");
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("cmd")),
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("a")),
                OpCode::PushConstant(Val::from("b")),
                OpCode::CloseFrame,
                OpCode::ResolveValue,
                OpCode::ExpandValue,
                OpCode::EvaluateSentence,
            ]
        );
    }

    #[test]
    fn test_compile_qualified_word() {
        let program = compile("get d(key)");
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("get")),
                OpCode::PushConstant(Val::from("d")),
                OpCode::SetSource,
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("key")),
                OpCode::CloseFrame,
                OpCode::SelectKeys,
                OpCode::EvaluateSentence,
            ]
        );
    }

    #[test]
    fn test_compile_args() {
        let program = Compiler::new().compile_pair(Val::from("guard"), Val::Int(1));
        assert_eq!(
            program.opcodes,
            vec![
                OpCode::OpenFrame,
                OpCode::PushConstant(Val::from("guard")),
                OpCode::PushConstant(Val::Int(1)),
                OpCode::EvaluateSentence,
            ]
        );
        assert!(Compiler::new().compile_args(&[]).is_empty());
    }
}
