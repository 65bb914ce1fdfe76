//! Regular grammars and finite automata.
//!
//! This library generates strings from right-linear grammars, classifies
//! grammars in the Chomsky hierarchy, converts between grammars and finite
//! automata, tests string membership and turns non-deterministic automata
//! into deterministic ones by subset construction.
//!
//! # Example
//!
//! ```rust
//! use regular_lab::{AutomatonBuilder, ChomskyType, GrammarBuilder};
//!
//! // S → aS | b
//! let grammar = GrammarBuilder::new('S')
//!     .add_rules('S', &["aS", "b"])
//!     .build()
//!     .unwrap();
//! assert_eq!(grammar.classify(), ChomskyType::Type3);
//!
//! let automaton = grammar.to_automaton();
//! assert!(automaton.accepts("aab"));
//! assert!(!automaton.accepts("aba"));
//!
//! // An NFA for strings over {a, b} ending in "ab"
//! let nfa = AutomatonBuilder::<String>::new("p")
//!     .final_state("r")
//!     .transition("p", 'a', "p")
//!     .transition("p", 'b', "p")
//!     .transition("p", 'a', "q")
//!     .transition("q", 'b', "r")
//!     .build()
//!     .unwrap();
//! assert!(!nfa.is_deterministic());
//!
//! let dfa = nfa.to_dfa();
//! assert!(dfa.is_partial_dfa());
//! assert!(dfa.accepts("bab"));
//! assert!(!dfa.accepts("ba"));
//! ```

pub mod automaton;
pub mod definition;
pub mod grammar;
pub mod symbol;
pub mod utils;

pub use automaton::{AutomatonBuilder, CompositeState, FiniteAutomaton, Nondeterminism};
pub use definition::{AutomatonDefinition, GrammarDefinition, load_automaton, load_grammar};
pub use grammar::{ChomskyType, Classification, Grammar, GrammarBuilder, GrammarConfig};
pub use symbol::{EPSILON, Production, Symbol};
pub use utils::{Error, EventRecorder, NoopObserver, Result, TraceEvent, TraceObserver};
