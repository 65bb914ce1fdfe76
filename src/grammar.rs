use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::automaton::{FiniteAutomaton, Transitions};
use crate::symbol::{EPSILON, Production, ProductionShape, Symbol};
use crate::utils::{Error, NoopObserver, OptionExt, Result, TraceEvent, TraceObserver};

/// Name of the extra accepting state added by [`Grammar::to_automaton`]
pub const FINAL_STATE: &str = "qf";

/// Configuration options for grammar behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    /// Maximum nesting of non-terminal expansions during generation
    pub max_recursion_depth: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            max_recursion_depth: 100,
        }
    }
}

/// The four levels of the Chomsky hierarchy, least restrictive first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChomskyType {
    Type0,
    Type1,
    Type2,
    Type3,
}

impl fmt::Display for ChomskyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChomskyType::Type0 => "Type 0: Unrestricted Grammar",
            ChomskyType::Type1 => "Type 1: Context-Sensitive Grammar",
            ChomskyType::Type2 => "Type 2: Context-Free Grammar",
            ChomskyType::Type3 => "Type 3: Regular Grammar",
        };
        f.write_str(name)
    }
}

/// Outcome of each Chomsky-type check, evaluated over every production
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub type0: bool,
    pub type1: bool,
    pub type2: bool,
    pub type3: bool,
}

impl Classification {
    /// The most specific type whose check passed.
    ///
    /// The regular check stands on its own; below it, context-free needs
    /// the context-sensitive check to pass as well.
    pub fn most_specific(&self) -> ChomskyType {
        if self.type3 {
            ChomskyType::Type3
        } else if self.type1 && self.type2 {
            ChomskyType::Type2
        } else if self.type1 {
            ChomskyType::Type1
        } else {
            ChomskyType::Type0
        }
    }

    /// Whether the grammar can be treated as `ty`.
    ///
    /// A regular grammar's `S → ε` rule is accepted by the relaxed
    /// context-sensitive check even when `S` appears on a right-hand side.
    pub fn satisfies(&self, ty: ChomskyType) -> bool {
        match ty {
            ChomskyType::Type0 => self.type0,
            ChomskyType::Type1 => self.type1 || self.type3,
            ChomskyType::Type2 => self.type2,
            ChomskyType::Type3 => self.type3,
        }
    }
}

/// A grammar whose productions each rewrite a single non-terminal
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    non_terminals: BTreeSet<char>,
    terminals: BTreeSet<char>,
    /// The rules mapping non-terminals to their alternatives, in order
    productions: BTreeMap<char, Vec<Production>>,
    start: char,
    config: GrammarConfig,
}

impl Grammar {
    /// Create a grammar, checking that its parts agree with each other
    pub fn new<N, T>(
        non_terminals: N,
        terminals: T,
        productions: BTreeMap<char, Vec<Production>>,
        start: char,
    ) -> Result<Self>
    where
        N: IntoIterator<Item = char>,
        T: IntoIterator<Item = char>,
    {
        let non_terminals: BTreeSet<char> = non_terminals.into_iter().collect();
        let terminals: BTreeSet<char> = terminals.into_iter().collect();

        if non_terminals.contains(&EPSILON) || terminals.contains(&EPSILON) {
            return Err(Error::ReservedSymbol(EPSILON));
        }
        if let Some(c) = non_terminals.intersection(&terminals).next() {
            return Err(Error::OverlappingSymbol(*c));
        }
        if !non_terminals.contains(&start) {
            return Err(Error::UnknownNonTerminal(start));
        }
        for (lhs, rules) in &productions {
            if !non_terminals.contains(lhs) {
                return Err(Error::UnknownNonTerminal(*lhs));
            }
            for symbol in rules.iter().flat_map(|p| p.symbols.iter()) {
                match symbol {
                    Symbol::Terminal(c) if !terminals.contains(c) => {
                        return Err(Error::UnknownSymbol(*c));
                    }
                    Symbol::NonTerminal(c) if !non_terminals.contains(c) => {
                        return Err(Error::UnknownNonTerminal(*c));
                    }
                    _ => {}
                }
            }
        }

        Ok(Self::assemble(non_terminals, terminals, productions, start))
    }

    pub(crate) fn assemble(
        non_terminals: BTreeSet<char>,
        terminals: BTreeSet<char>,
        productions: BTreeMap<char, Vec<Production>>,
        start: char,
    ) -> Self {
        Grammar {
            non_terminals,
            terminals,
            productions,
            start,
            config: GrammarConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse a grammar from a file of `A -> aB | a | ε` rules
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_rules_str(&content)
    }

    /// Parse a grammar from `A -> aB | a | ε` rules, one per line.
    ///
    /// Left-hand sides and uppercase ASCII letters are non-terminals, the
    /// first left-hand side is the start symbol, `#` starts a comment.
    pub fn from_rules_str(text: &str) -> Result<Self> {
        let rule_regex = Regex::new(r"^\s*(\S)\s*(?:->|→)\s*(.*?)\s*$")
            .map_err(|e| Error::Parse(e.to_string()))?;

        let mut builder: Option<GrammarBuilder> = None;
        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let captures = rule_regex
                .captures(trimmed)
                .ok_or_else(|| Error::Parse(format!("line {}: {}", number + 1, trimmed)))?;
            let lhs = captures[1]
                .chars()
                .next()
                .ok_or_else(|| Error::Parse(format!("line {}: missing left-hand side", number + 1)))?;

            let rhs = &captures[2];
            let alternatives: Vec<&str> = rhs.split('|').map(str::trim).collect();
            if alternatives.len() > 1 && alternatives.iter().any(|a| a.is_empty()) {
                return Err(Error::Parse(format!(
                    "line {}: empty alternative in '{}' (write ε for the empty string)",
                    number + 1,
                    trimmed
                )));
            }

            let current = builder.get_or_insert_with(|| GrammarBuilder::new(lhs));
            for alternative in alternatives {
                current.push_rule(lhs, alternative);
            }
        }

        builder
            .ok_or_grammar_err(|| "no rules found".to_string())?
            .build()
    }

    pub fn non_terminals(&self) -> &BTreeSet<char> {
        &self.non_terminals
    }

    pub fn terminals(&self) -> &BTreeSet<char> {
        &self.terminals
    }

    pub fn productions(&self) -> &BTreeMap<char, Vec<Production>> {
        &self.productions
    }

    /// Alternatives for one non-terminal; empty when it has none
    pub fn productions_for(&self, non_terminal: char) -> &[Production] {
        self.productions
            .get(&non_terminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn start(&self) -> char {
        self.start
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GrammarConfig) {
        self.config = config;
    }

    /// Generate a random string of the language using the thread-local RNG
    pub fn generate(&self) -> Result<String> {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generate a random string, drawing production choices from `rng`
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
        self.generate_traced(rng, &NoopObserver)
    }

    pub fn generate_traced<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        observer: &dyn TraceObserver,
    ) -> Result<String> {
        observer.observe(&TraceEvent::GenerationStarted { start: self.start });

        let mut result = String::new();
        self.expand_non_terminal(self.start, 0, rng, observer, &mut result)?;

        observer.observe(&TraceEvent::Generated {
            text: result.clone(),
        });
        Ok(result)
    }

    /// Recursively expand a non-terminal into `out`
    fn expand_non_terminal<R: Rng + ?Sized>(
        &self,
        symbol: char,
        depth: usize,
        rng: &mut R,
        observer: &dyn TraceObserver,
        out: &mut String,
    ) -> Result<()> {
        if depth >= self.config.max_recursion_depth {
            return Err(Error::GenerationDepthExceeded {
                depth: self.config.max_recursion_depth,
            });
        }

        let Some(production) = self.productions_for(symbol).choose(rng) else {
            observer.observe(&TraceEvent::DeadEnd {
                non_terminal: symbol,
            });
            return Ok(());
        };
        observer.observe(&TraceEvent::ProductionApplied {
            non_terminal: symbol,
            production: production.to_string(),
        });

        for element in &production.symbols {
            match element {
                Symbol::Terminal(c) => out.push(*c),
                Symbol::NonTerminal(next) => {
                    self.expand_non_terminal(*next, depth + 1, rng, observer, out)?
                }
            }
        }
        Ok(())
    }

    /// Run every Chomsky-type check over all productions
    pub fn classification(&self) -> Classification {
        let start = Symbol::NonTerminal(self.start);
        let start_on_rhs = self
            .productions
            .values()
            .flatten()
            .any(|production| production.contains(&start));

        let mut type1 = true;
        let mut type3 = true;
        for (&lhs, rules) in &self.productions {
            for production in rules {
                match production.shape() {
                    ProductionShape::Empty => {
                        if lhs != self.start || start_on_rhs {
                            type1 = false;
                        }
                        if lhs != self.start {
                            type3 = false;
                        }
                    }
                    ProductionShape::Terminal(_) | ProductionShape::TerminalNonTerminal(..) => {}
                    ProductionShape::Other => type3 = false,
                }
            }
        }

        Classification {
            // Every production has a non-terminal on the left
            type0: true,
            type1,
            // Left-hand sides are always a single non-terminal
            type2: true,
            type3,
        }
    }

    /// The most specific Chomsky type of this grammar
    pub fn classify(&self) -> ChomskyType {
        self.classification().most_specific()
    }

    /// Convert to an automaton with one state per non-terminal plus the
    /// accepting state [`FINAL_STATE`].
    ///
    /// Productions that are not `ε`, `a` or `aB` are skipped.
    pub fn to_automaton(&self) -> FiniteAutomaton {
        let final_state = FINAL_STATE.to_string();
        let mut states: BTreeSet<String> =
            self.non_terminals.iter().map(|c| c.to_string()).collect();
        states.insert(final_state.clone());
        let mut finals = BTreeSet::new();
        finals.insert(final_state.clone());

        let mut transitions: Transitions<String> = BTreeMap::new();
        for (lhs, rules) in &self.productions {
            let from = lhs.to_string();
            for production in rules {
                let (symbol, to) = match production.shape() {
                    ProductionShape::Empty => {
                        finals.insert(from.clone());
                        continue;
                    }
                    ProductionShape::Terminal(a) => (a, final_state.clone()),
                    ProductionShape::TerminalNonTerminal(a, next) => (a, next.to_string()),
                    ProductionShape::Other => continue,
                };
                transitions
                    .entry(from.clone())
                    .or_default()
                    .entry(symbol)
                    .or_default()
                    .insert(to);
            }
        }

        FiniteAutomaton::assemble(
            states,
            self.terminals.clone(),
            transitions,
            self.start.to_string(),
            finals,
        )
    }
}

impl FromStr for Grammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_rules_str(s)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<char>| {
            set.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "Non-terminals (VN): {{{}}}", join(&self.non_terminals))?;
        writeln!(f, "Terminals (VT): {{{}}}", join(&self.terminals))?;
        writeln!(f, "Start Symbol (S): {}", self.start)?;
        writeln!(f, "Productions (P):")?;
        for (lhs, rules) in &self.productions {
            let alternatives: Vec<String> = rules.iter().map(|p| p.to_string()).collect();
            writeln!(f, "  {} → {}", lhs, alternatives.join(" | "))?;
        }
        Ok(())
    }
}

/// Builder for constructing Grammar instances from rule strings.
///
/// Non-terminals are the start symbol, every left-hand side and every
/// uppercase ASCII letter used on a right-hand side; all other characters
/// are terminals.
pub struct GrammarBuilder {
    start: char,
    rules: Vec<(char, String)>,
    config: GrammarConfig,
}

impl GrammarBuilder {
    /// Create a new grammar builder with default config
    pub fn new(start: char) -> Self {
        GrammarBuilder {
            start,
            rules: Vec::new(),
            config: GrammarConfig::default(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Add one alternative, e.g. `add_rule('S', "aS")` or `add_rule('S', "ε")`
    pub fn add_rule(mut self, non_terminal: char, rhs: &str) -> Self {
        self.push_rule(non_terminal, rhs);
        self
    }

    /// Add several alternatives for the same non-terminal
    pub fn add_rules(mut self, non_terminal: char, alternatives: &[&str]) -> Self {
        for rhs in alternatives {
            self.push_rule(non_terminal, rhs);
        }
        self
    }

    fn push_rule(&mut self, non_terminal: char, rhs: &str) {
        self.rules.push((non_terminal, rhs.trim().to_string()));
    }

    /// Build the grammar, checking it like [`Grammar::new`]
    pub fn build(self) -> Result<Grammar> {
        let mut non_terminals = BTreeSet::new();
        non_terminals.insert(self.start);
        for (lhs, rhs) in &self.rules {
            non_terminals.insert(*lhs);
            non_terminals.extend(rhs.chars().filter(|c| c.is_ascii_uppercase()));
        }

        let mut terminals = BTreeSet::new();
        let mut productions: BTreeMap<char, Vec<Production>> = BTreeMap::new();
        for (lhs, rhs) in &self.rules {
            let production = Production::parse(rhs, &non_terminals);
            terminals.extend(
                production
                    .symbols
                    .iter()
                    .filter(|s| s.is_terminal())
                    .map(Symbol::as_char),
            );
            productions.entry(*lhs).or_default().push(production);
        }

        Ok(Grammar::new(non_terminals, terminals, productions, self.start)?.with_config(self.config))
    }
}
