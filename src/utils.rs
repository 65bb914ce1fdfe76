use std::fmt;
use std::io;
use std::sync::Mutex;
use thiserror::Error;

/// Error types for grammar and automaton operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Unknown non-terminal: {0}")]
    UnknownNonTerminal(char),

    #[error("Symbol is both terminal and non-terminal: {0}")]
    OverlappingSymbol(char),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(char),

    #[error("Reserved symbol cannot appear in a grammar or alphabet: {0}")]
    ReservedSymbol(char),

    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("Generation exceeded the maximum recursion depth of {depth}")]
    GenerationDepthExceeded { depth: usize },
}

/// Result type for grammar and automaton operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single step reported while generating, running or converting.
///
/// State sets are rendered with `Display` so one event type serves every
/// automaton state type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// String generation began at the start symbol
    GenerationStarted { start: char },
    /// A production was chosen for a non-terminal
    ProductionApplied { non_terminal: char, production: String },
    /// A non-terminal had no productions; it expands to nothing
    DeadEnd { non_terminal: char },
    /// String generation finished
    Generated { text: String },
    /// A membership test began
    InputStarted { input: String, states: Vec<String> },
    /// The set of possible states advanced on a symbol
    Stepped { symbol: char, from: Vec<String>, to: Vec<String> },
    /// No possible state had a transition on the symbol
    Stuck { symbol: char, from: Vec<String> },
    /// The whole input was consumed
    InputFinished { states: Vec<String>, accepted: bool },
    /// Subset construction found a new composite state
    SubsetDiscovered { state: String, is_final: bool },
    /// Subset construction added a composite transition
    SubsetTransition { from: String, symbol: char, to: String },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::GenerationStarted { start } => {
                write!(f, "starting generation at {}", start)
            }
            TraceEvent::ProductionApplied {
                non_terminal,
                production,
            } => write!(f, "applying {} → {}", non_terminal, production),
            TraceEvent::DeadEnd { non_terminal } => {
                write!(f, "no productions for {}", non_terminal)
            }
            TraceEvent::Generated { text } => write!(f, "generated '{}'", text),
            TraceEvent::InputStarted { input, states } => {
                write!(f, "checking '{}' from {{{}}}", input, states.join(", "))
            }
            TraceEvent::Stepped { symbol, from, to } => write!(
                f,
                "{{{}}} --{}--> {{{}}}",
                from.join(", "),
                symbol,
                to.join(", ")
            ),
            TraceEvent::Stuck { symbol, from } => write!(
                f,
                "no transition on '{}' from {{{}}}",
                symbol,
                from.join(", ")
            ),
            TraceEvent::InputFinished { states, accepted } => write!(
                f,
                "ended at {{{}}}, accepted: {}",
                states.join(", "),
                accepted
            ),
            TraceEvent::SubsetDiscovered { state, is_final } => {
                if *is_final {
                    write!(f, "new DFA state {} (final)", state)
                } else {
                    write!(f, "new DFA state {}", state)
                }
            }
            TraceEvent::SubsetTransition { from, symbol, to } => {
                write!(f, "δ({}, {}) = {}", from, symbol, to)
            }
        }
    }
}

/// Trait for consumers of trace events
pub trait TraceObserver: Send + Sync + fmt::Debug {
    /// Receive a single event
    fn observe(&self, event: &TraceEvent);

    /// Get the name of this observer
    fn name(&self) -> &str;
}

/// An observer that discards every event
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {
    fn observe(&self, _event: &TraceEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}

/// An observer that keeps every event it receives
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<TraceEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<TraceEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl TraceObserver for EventRecorder {
    fn observe(&self, event: &TraceEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

/// Trait extension for Option<T> to convert to a grammar error
pub trait OptionExt<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| Error::InvalidGrammar(f()))
    }
}
