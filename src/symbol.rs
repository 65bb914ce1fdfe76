use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Textual marker for the empty string
pub const EPSILON: char = 'ε';

/// Represents a grammar symbol, either a terminal or a non-terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// A terminal symbol (a letter of the alphabet)
    Terminal(char),
    /// A non-terminal symbol (reference to another rule)
    NonTerminal(char),
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Terminal(c) | Symbol::NonTerminal(c) => *c,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The shapes a right-hand side can take, as far as the regular
/// grammar / automaton bridge is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionShape {
    /// `A → ε`
    Empty,
    /// `A → a`
    Terminal(char),
    /// `A → aB`
    TerminalNonTerminal(char, char),
    /// Anything else
    Other,
}

/// Represents the right-hand side of a production rule.
///
/// An empty sequence is the ε production.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Production {
    /// The sequence of symbols in this production
    pub symbols: Vec<Symbol>,
}

impl Production {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Production { symbols }
    }

    /// The ε production
    pub fn epsilon() -> Self {
        Production::default()
    }

    /// `A → a`
    pub fn terminal(terminal: char) -> Self {
        Production::new(vec![Symbol::Terminal(terminal)])
    }

    /// `A → aB`
    pub fn step(terminal: char, next: char) -> Self {
        Production::new(vec![Symbol::Terminal(terminal), Symbol::NonTerminal(next)])
    }

    /// Resolve a right-hand side written as plain characters.
    ///
    /// `""` and `"ε"` both denote the empty production. Characters found in
    /// `non_terminals` become non-terminals, everything else is a terminal.
    pub fn parse(rhs: &str, non_terminals: &BTreeSet<char>) -> Self {
        let rhs = rhs.trim();
        if rhs.is_empty() || rhs == EPSILON.to_string() {
            return Production::epsilon();
        }

        let symbols = rhs
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| {
                if non_terminals.contains(&c) {
                    Symbol::NonTerminal(c)
                } else {
                    Symbol::Terminal(c)
                }
            })
            .collect();
        Production { symbols }
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn shape(&self) -> ProductionShape {
        match self.symbols.as_slice() {
            [] => ProductionShape::Empty,
            [Symbol::Terminal(a)] => ProductionShape::Terminal(*a),
            [Symbol::Terminal(a), Symbol::NonTerminal(b)] => {
                ProductionShape::TerminalNonTerminal(*a, *b)
            }
            _ => ProductionShape::Other,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbols.is_empty() {
            return write!(f, "{}", EPSILON);
        }
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
