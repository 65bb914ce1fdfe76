use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::grammar::Grammar;
use crate::symbol::{EPSILON, Production};
use crate::utils::{Error, NoopObserver, Result, TraceEvent, TraceObserver};

/// Transition relation: state → symbol → successor states
pub type Transitions<S> = BTreeMap<S, BTreeMap<char, BTreeSet<S>>>;

/// A DFA state built by subset construction: a sorted, duplicate-free
/// set of states of the source automaton.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeState<S>(Vec<S>);

impl<S: Ord> CompositeState<S> {
    pub fn new<I: IntoIterator<Item = S>>(members: I) -> Self {
        let mut members: Vec<S> = members.into_iter().collect();
        members.sort();
        members.dedup();
        CompositeState(members)
    }

    pub fn members(&self) -> &[S] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.0.iter()
    }

    pub fn contains(&self, state: &S) -> bool {
        self.0.binary_search(state).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Ord> FromIterator<S> for CompositeState<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CompositeState::new(iter)
    }
}

impl<S: fmt::Display> fmt::Display for CompositeState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, state) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", state)?;
        }
        write!(f, "}}")
    }
}

/// Why an automaton is not a complete DFA
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nondeterminism<S> {
    /// A (state, symbol) pair leads to more than one state
    MultipleSuccessors {
        state: S,
        symbol: char,
        successors: BTreeSet<S>,
    },
    /// A state has no outgoing transitions at all
    NoTransitions { state: S },
    /// A state has no transition on an alphabet symbol
    MissingTransition { state: S, symbol: char },
}

impl<S: fmt::Display> fmt::Display for Nondeterminism<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nondeterminism::MultipleSuccessors {
                state,
                symbol,
                successors,
            } => {
                let names: Vec<String> = successors.iter().map(|s| s.to_string()).collect();
                write!(
                    f,
                    "state {} has multiple transitions on '{}': {{{}}}",
                    state,
                    symbol,
                    names.join(", ")
                )
            }
            Nondeterminism::NoTransitions { state } => {
                write!(f, "state {} has no transitions", state)
            }
            Nondeterminism::MissingTransition { state, symbol } => {
                write!(f, "state {} has no transition on '{}'", state, symbol)
            }
        }
    }
}

/// A finite automaton whose transition relation may be non-deterministic.
///
/// Every value is immutable once built; conversions return new automata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteAutomaton<S = String> {
    states: BTreeSet<S>,
    alphabet: BTreeSet<char>,
    transitions: Transitions<S>,
    initial: S,
    finals: BTreeSet<S>,
}

impl<S> FiniteAutomaton<S>
where
    S: Ord + Clone + fmt::Display,
{
    /// Create an automaton from a list of `(from, symbol, to)` transitions
    pub fn new<Q, A, T, F>(states: Q, alphabet: A, transitions: T, initial: S, finals: F) -> Result<Self>
    where
        Q: IntoIterator<Item = S>,
        A: IntoIterator<Item = char>,
        T: IntoIterator<Item = (S, char, S)>,
        F: IntoIterator<Item = S>,
    {
        let mut relation: Transitions<S> = BTreeMap::new();
        for (from, symbol, to) in transitions {
            relation
                .entry(from)
                .or_default()
                .entry(symbol)
                .or_default()
                .insert(to);
        }
        Self::from_parts(
            states.into_iter().collect(),
            alphabet.into_iter().collect(),
            relation,
            initial,
            finals.into_iter().collect(),
        )
    }

    /// Create an automaton from its five components, checking that they agree
    pub fn from_parts(
        states: BTreeSet<S>,
        alphabet: BTreeSet<char>,
        transitions: Transitions<S>,
        initial: S,
        finals: BTreeSet<S>,
    ) -> Result<Self> {
        if alphabet.contains(&EPSILON) {
            return Err(Error::ReservedSymbol(EPSILON));
        }
        if !states.contains(&initial) {
            return Err(Error::UnknownState(initial.to_string()));
        }
        if let Some(state) = finals.iter().find(|s| !states.contains(*s)) {
            return Err(Error::UnknownState(state.to_string()));
        }
        for (from, row) in &transitions {
            if !states.contains(from) {
                return Err(Error::UnknownState(from.to_string()));
            }
            for (symbol, targets) in row {
                if !alphabet.contains(symbol) {
                    return Err(Error::UnknownSymbol(*symbol));
                }
                if let Some(to) = targets.iter().find(|s| !states.contains(*s)) {
                    return Err(Error::UnknownState(to.to_string()));
                }
            }
        }

        Ok(Self::assemble(states, alphabet, transitions, initial, finals))
    }

    /// Build without validation, dropping empty successor sets so that a
    /// missing key always means "no transition".
    pub(crate) fn assemble(
        states: BTreeSet<S>,
        alphabet: BTreeSet<char>,
        mut transitions: Transitions<S>,
        initial: S,
        finals: BTreeSet<S>,
    ) -> Self {
        for row in transitions.values_mut() {
            row.retain(|_, targets| !targets.is_empty());
        }
        transitions.retain(|_, row| !row.is_empty());

        FiniteAutomaton {
            states,
            alphabet,
            transitions,
            initial,
            finals,
        }
    }

    pub fn states(&self) -> &BTreeSet<S> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn transitions(&self) -> &Transitions<S> {
        &self.transitions
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    pub fn finals(&self) -> &BTreeSet<S> {
        &self.finals
    }

    pub fn is_final(&self, state: &S) -> bool {
        self.finals.contains(state)
    }

    /// Successor states of a single (state, symbol) pair
    pub fn successors(&self, state: &S, symbol: char) -> Option<&BTreeSet<S>> {
        self.transitions.get(state).and_then(|row| row.get(&symbol))
    }

    /// Union of the successors of every state in `states` on `symbol`
    fn move_on<'a, I>(&'a self, states: I, symbol: char) -> BTreeSet<&'a S>
    where
        I: IntoIterator<Item = &'a S>,
    {
        states
            .into_iter()
            .filter_map(|state| self.successors(state, symbol))
            .flatten()
            .collect()
    }

    /// Check whether the automaton accepts `input`.
    ///
    /// Works for both deterministic and non-deterministic automata by
    /// tracking the set of states the automaton could be in.
    pub fn accepts(&self, input: &str) -> bool {
        self.accepts_traced(input, &NoopObserver)
    }

    /// Same as [`accepts`](Self::accepts), reporting every step to `observer`
    pub fn accepts_traced(&self, input: &str, observer: &dyn TraceObserver) -> bool {
        let mut current: BTreeSet<&S> = BTreeSet::new();
        current.insert(&self.initial);
        observer.observe(&TraceEvent::InputStarted {
            input: input.to_string(),
            states: render(current.iter().copied()),
        });

        for symbol in input.chars() {
            let next = self.move_on(current.iter().copied(), symbol);
            if next.is_empty() {
                observer.observe(&TraceEvent::Stuck {
                    symbol,
                    from: render(current.iter().copied()),
                });
                return false;
            }

            observer.observe(&TraceEvent::Stepped {
                symbol,
                from: render(current.iter().copied()),
                to: render(next.iter().copied()),
            });
            current = next;
        }

        let accepted = current.iter().any(|state| self.is_final(state));
        observer.observe(&TraceEvent::InputFinished {
            states: render(current.iter().copied()),
            accepted,
        });
        accepted
    }

    /// First reason this automaton is not a complete DFA, if any.
    ///
    /// Multiple successors are reported first, then states with no
    /// transitions at all, then missing (state, symbol) pairs.
    pub fn nondeterminism(&self) -> Option<Nondeterminism<S>> {
        for (state, row) in &self.transitions {
            for (symbol, successors) in row {
                if successors.len() > 1 {
                    return Some(Nondeterminism::MultipleSuccessors {
                        state: state.clone(),
                        symbol: *symbol,
                        successors: successors.clone(),
                    });
                }
            }
        }

        for state in &self.states {
            if !self.transitions.contains_key(state) {
                return Some(Nondeterminism::NoTransitions {
                    state: state.clone(),
                });
            }
            for symbol in &self.alphabet {
                if self.successors(state, *symbol).is_none() {
                    return Some(Nondeterminism::MissingTransition {
                        state: state.clone(),
                        symbol: *symbol,
                    });
                }
            }
        }

        None
    }

    /// True iff every state has outgoing transitions and exactly one
    /// successor on every symbol
    pub fn is_deterministic(&self) -> bool {
        self.nondeterminism().is_none()
    }

    /// True iff no (state, symbol) pair has more than one successor.
    ///
    /// Missing transitions are allowed, which is the shape produced by
    /// [`to_dfa`](Self::to_dfa).
    pub fn is_partial_dfa(&self) -> bool {
        self.transitions
            .values()
            .flat_map(|row| row.values())
            .all(|successors| successors.len() <= 1)
    }

    /// Subset construction. Symbols with no successors are left out, so
    /// the result may be a partial DFA.
    pub fn to_dfa(&self) -> FiniteAutomaton<CompositeState<S>> {
        self.subset_construction(false, &NoopObserver)
    }

    pub fn to_dfa_traced(&self, observer: &dyn TraceObserver) -> FiniteAutomaton<CompositeState<S>> {
        self.subset_construction(false, observer)
    }

    /// Subset construction that keeps the empty composite state `{}` as an
    /// explicit sink, so over a non-empty alphabet the result is always a
    /// complete DFA.
    pub fn to_complete_dfa(&self) -> FiniteAutomaton<CompositeState<S>> {
        self.subset_construction(true, &NoopObserver)
    }

    fn subset_construction(
        &self,
        complete: bool,
        observer: &dyn TraceObserver,
    ) -> FiniteAutomaton<CompositeState<S>> {
        let initial = CompositeState::new([self.initial.clone()]);

        let mut queue = VecDeque::new();
        queue.push_back(initial.clone());
        let mut processed = BTreeSet::new();
        let mut transitions: Transitions<CompositeState<S>> = BTreeMap::new();
        let mut finals = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            if !processed.insert(current.clone()) {
                continue;
            }

            let is_final = current.iter().any(|state| self.is_final(state));
            observer.observe(&TraceEvent::SubsetDiscovered {
                state: current.to_string(),
                is_final,
            });
            if is_final {
                finals.insert(current.clone());
            }

            for &symbol in &self.alphabet {
                let next = self.move_on(current.iter(), symbol);
                if next.is_empty() && !complete {
                    continue;
                }

                let next: CompositeState<S> = next.into_iter().cloned().collect();
                observer.observe(&TraceEvent::SubsetTransition {
                    from: current.to_string(),
                    symbol,
                    to: next.to_string(),
                });
                transitions
                    .entry(current.clone())
                    .or_default()
                    .entry(symbol)
                    .or_default()
                    .insert(next.clone());

                if !processed.contains(&next) {
                    queue.push_back(next);
                }
            }
        }

        FiniteAutomaton::assemble(processed, self.alphabet.clone(), transitions, initial, finals)
    }

    /// Assign every state a distinct non-terminal. The initial state gets
    /// `S` when that char is free; the rest follow in state order.
    fn non_terminal_names(&self) -> BTreeMap<&S, char> {
        let mut used: BTreeSet<char> = self.alphabet.clone();
        used.insert(EPSILON);

        let mut pool = ('A'..='Z')
            .chain('\u{0391}'..=char::MAX)
            .filter(|c| c.is_alphabetic());
        let mut names = BTreeMap::new();

        if !used.contains(&'S') {
            names.insert(&self.initial, 'S');
            used.insert('S');
        }

        for state in std::iter::once(&self.initial).chain(self.states.iter()) {
            if names.contains_key(state) {
                continue;
            }
            if let Some(name) = pool.find(|c| !used.contains(c)) {
                used.insert(name);
                names.insert(state, name);
            }
        }

        names
    }

    /// Convert to a right-linear grammar.
    ///
    /// For each transition `p --a--> q`: `P → a` when `q` is final, and
    /// `P → aQ` when `q` is not final or can still move on. Final states
    /// also get `ε`.
    pub fn to_grammar(&self) -> Grammar {
        let names = self.non_terminal_names();
        let mut productions: BTreeMap<char, Vec<Production>> = BTreeMap::new();

        for state in &self.states {
            let lhs = names[state];
            let rules = productions.entry(lhs).or_default();

            for (&symbol, targets) in self.transitions.get(state).into_iter().flatten() {
                for target in targets {
                    if self.is_final(target) {
                        push_unique(rules, Production::terminal(symbol));
                    }
                    if !self.is_final(target) || self.transitions.contains_key(target) {
                        push_unique(rules, Production::step(symbol, names[target]));
                    }
                }
            }

            if self.is_final(state) {
                push_unique(rules, Production::epsilon());
            }
        }

        Grammar::assemble(
            names.values().copied().collect(),
            self.alphabet.clone(),
            productions,
            names[&self.initial],
        )
    }
}

fn push_unique(rules: &mut Vec<Production>, production: Production) {
    if !rules.contains(&production) {
        rules.push(production);
    }
}

fn render<'a, S, I>(states: I) -> Vec<String>
where
    S: fmt::Display + 'a,
    I: IntoIterator<Item = &'a S>,
{
    states.into_iter().map(|s| s.to_string()).collect()
}

impl<S> fmt::Display for FiniteAutomaton<S>
where
    S: Ord + Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alphabet: Vec<String> = self.alphabet.iter().map(|c| c.to_string()).collect();
        writeln!(f, "States (Q): {{{}}}", render(&self.states).join(", "))?;
        writeln!(f, "Alphabet (Σ): {{{}}}", alphabet.join(", "))?;
        writeln!(f, "Initial State (q0): {}", self.initial)?;
        writeln!(f, "Final States (F): {{{}}}", render(&self.finals).join(", "))?;
        writeln!(f, "Transition Function (δ):")?;
        for (state, row) in &self.transitions {
            for (symbol, targets) in row {
                writeln!(f, "  δ({}, {}) = {{{}}}", state, symbol, render(targets).join(", "))?;
            }
        }
        Ok(())
    }
}

/// Builder for constructing automata one transition at a time.
///
/// States and symbols mentioned by transitions are added automatically.
pub struct AutomatonBuilder<S = String> {
    states: BTreeSet<S>,
    alphabet: BTreeSet<char>,
    transitions: Vec<(S, char, S)>,
    initial: S,
    finals: BTreeSet<S>,
}

impl<S> AutomatonBuilder<S>
where
    S: Ord + Clone + fmt::Display,
{
    pub fn new(initial: impl Into<S>) -> Self {
        let initial = initial.into();
        let mut states = BTreeSet::new();
        states.insert(initial.clone());
        AutomatonBuilder {
            states,
            alphabet: BTreeSet::new(),
            transitions: Vec::new(),
            initial,
            finals: BTreeSet::new(),
        }
    }

    /// Add a state with no transitions yet
    pub fn state(mut self, state: impl Into<S>) -> Self {
        self.states.insert(state.into());
        self
    }

    /// Add an accepting state
    pub fn final_state(mut self, state: impl Into<S>) -> Self {
        let state = state.into();
        self.states.insert(state.clone());
        self.finals.insert(state);
        self
    }

    /// Add a symbol that may have no transitions
    pub fn symbol(mut self, symbol: char) -> Self {
        self.alphabet.insert(symbol);
        self
    }

    pub fn transition(mut self, from: impl Into<S>, symbol: char, to: impl Into<S>) -> Self {
        let (from, to) = (from.into(), to.into());
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.alphabet.insert(symbol);
        self.transitions.push((from, symbol, to));
        self
    }

    pub fn build(self) -> Result<FiniteAutomaton<S>> {
        FiniteAutomaton::new(
            self.states,
            self.alphabet,
            self.transitions,
            self.initial,
            self.finals,
        )
    }
}
