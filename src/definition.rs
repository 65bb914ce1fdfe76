use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::automaton::FiniteAutomaton;
use crate::grammar::Grammar;
use crate::symbol::Production;
use crate::utils::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDefinition {
    pub non_terminals: Vec<char>,
    pub terminals: Vec<char>,
    /// Right-hand sides written as plain characters; `"ε"` or `""` is empty
    pub productions: BTreeMap<String, Vec<String>>,
    pub start: char,
}

impl GrammarDefinition {
    /// Load a grammar definition from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve the rule strings and validate the result
    pub fn into_grammar(self) -> Result<Grammar> {
        let non_terminals: BTreeSet<char> = self.non_terminals.into_iter().collect();

        let mut productions: BTreeMap<char, Vec<Production>> = BTreeMap::new();
        for (lhs, alternatives) in self.productions {
            let mut chars = lhs.chars();
            let key = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(Error::Parse(format!(
                        "production key must be a single character: {:?}",
                        lhs
                    )));
                }
            };
            let rules = productions.entry(key).or_default();
            for rhs in alternatives {
                rules.push(Production::parse(&rhs, &non_terminals));
            }
        }

        Grammar::new(non_terminals, self.terminals, productions, self.start)
    }
}

impl From<&Grammar> for GrammarDefinition {
    fn from(grammar: &Grammar) -> Self {
        GrammarDefinition {
            non_terminals: grammar.non_terminals().iter().copied().collect(),
            terminals: grammar.terminals().iter().copied().collect(),
            productions: grammar
                .productions()
                .iter()
                .map(|(lhs, rules)| {
                    (
                        lhs.to_string(),
                        rules.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
            start: grammar.start(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    pub from: String,
    pub symbol: char,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDefinition {
    pub states: Vec<String>,
    pub alphabet: Vec<char>,
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
    pub initial: String,
    #[serde(default)]
    pub finals: Vec<String>,
}

impl AutomatonDefinition {
    /// Load an automaton definition from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_automaton(self) -> Result<FiniteAutomaton> {
        FiniteAutomaton::new(
            self.states,
            self.alphabet,
            self.transitions
                .into_iter()
                .map(|t| (t.from, t.symbol, t.to)),
            self.initial,
            self.finals,
        )
    }
}

/// Any automaton can be written out; state names come from `Display`
impl<S> From<&FiniteAutomaton<S>> for AutomatonDefinition
where
    S: Ord + Clone + fmt::Display,
{
    fn from(automaton: &FiniteAutomaton<S>) -> Self {
        let mut transitions = Vec::new();
        for (from, row) in automaton.transitions() {
            for (symbol, targets) in row {
                for to in targets {
                    transitions.push(TransitionDefinition {
                        from: from.to_string(),
                        symbol: *symbol,
                        to: to.to_string(),
                    });
                }
            }
        }

        AutomatonDefinition {
            states: automaton.states().iter().map(|s| s.to_string()).collect(),
            alphabet: automaton.alphabet().iter().copied().collect(),
            transitions,
            initial: automaton.initial().to_string(),
            finals: automaton.finals().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Load a grammar from a `.json` definition or a rule file
pub fn load_grammar<P: AsRef<Path>>(path: P) -> Result<Grammar> {
    let path = path.as_ref();
    if is_json(path) {
        GrammarDefinition::from_json_file(path)?.into_grammar()
    } else {
        Grammar::from_file(path)
    }
}

/// Load an automaton from a `.json` definition
pub fn load_automaton<P: AsRef<Path>>(path: P) -> Result<FiniteAutomaton> {
    AutomatonDefinition::from_json_file(path)?.into_automaton()
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AutomatonBuilder;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    const LAB_AUTOMATON: &str = r#"{
        "states": ["q0", "q1", "q2", "q3"],
        "alphabet": ["a", "b"],
        "transitions": [
            {"from": "q0", "symbol": "a", "to": "q1"},
            {"from": "q1", "symbol": "a", "to": "q1"},
            {"from": "q1", "symbol": "b", "to": "q2"},
            {"from": "q2", "symbol": "b", "to": "q2"},
            {"from": "q2", "symbol": "b", "to": "q3"},
            {"from": "q3", "symbol": "a", "to": "q1"}
        ],
        "initial": "q0",
        "finals": ["q3"]
    }"#;

    #[test]
    fn test_automaton_from_json() {
        let fa = AutomatonDefinition::from_json_str(LAB_AUTOMATON)
            .unwrap()
            .into_automaton()
            .unwrap();
        assert!(!fa.is_deterministic());
        assert!(fa.accepts("abb"));
        assert!(!fa.accepts("ab"));
    }

    #[test]
    fn test_grammar_from_json() {
        let json = r#"{
            "non_terminals": ["S", "A"],
            "terminals": ["a", "b"],
            "productions": {"S": ["aA", "ε"], "A": ["b"]},
            "start": "S"
        }"#;
        let grammar = GrammarDefinition::from_json_str(json)
            .unwrap()
            .into_grammar()
            .unwrap();
        assert_eq!(grammar.productions_for('S').len(), 2);
        assert!(grammar.to_automaton().accepts("ab"));
        assert!(grammar.to_automaton().accepts(""));
    }

    #[test]
    fn test_grammar_definition_key_must_be_char() {
        let json = r#"{
            "non_terminals": ["S"],
            "terminals": ["a"],
            "productions": {"SS": ["a"]},
            "start": "S"
        }"#;
        let result = GrammarDefinition::from_json_str(json)
            .unwrap()
            .into_grammar();
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_dfa_definition_uses_composite_names() {
        let fa = AutomatonBuilder::<String>::new("p")
            .final_state("r")
            .transition("p", 'a', "p")
            .transition("p", 'a', "r")
            .build()
            .unwrap();
        let definition = AutomatonDefinition::from(&fa.to_dfa());

        assert_eq!(definition.initial, "{p}");
        assert_eq!(definition.finals, vec!["{p, r}".to_string()]);
        let json = definition.to_json().unwrap();
        let reloaded = AutomatonDefinition::from_json_str(&json).unwrap();
        assert_eq!(reloaded, definition);
        assert!(reloaded.into_automaton().unwrap().is_partial_dfa());
    }

    #[test]
    fn test_grammar_definition_from_grammar() {
        let grammar = Grammar::from_rules_str("S -> aS | b").unwrap();
        let definition = GrammarDefinition::from(&grammar);
        assert_eq!(definition.productions["S"], vec!["aS", "b"]);
        assert_eq!(definition.clone().into_grammar().unwrap(), grammar);
    }

    #[test]
    fn test_load_files() {
        let mut rules = Builder::new().suffix(".grammar").tempfile().unwrap();
        writeln!(rules, "S -> aS | ε").unwrap();
        let grammar = load_grammar(rules.path()).unwrap();
        assert!(grammar.to_automaton().accepts("aaa"));

        let mut json = Builder::new().suffix(".json").tempfile().unwrap();
        json.write_all(LAB_AUTOMATON.as_bytes()).unwrap();
        let fa = load_automaton(json.path()).unwrap();
        assert_eq!(fa.states().len(), 4);

        assert!(matches!(
            load_automaton("does/not/exist.json"),
            Err(Error::Io(_))
        ));
    }
}
