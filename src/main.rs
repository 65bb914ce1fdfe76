use clap::{Parser, Subcommand};
use regular_lab::utils::{NoopObserver, TraceEvent, TraceObserver};
use regular_lab::{AutomatonBuilder, FiniteAutomaton, Grammar, GrammarBuilder, GrammarConfig};
use regular_lab::{load_automaton, load_grammar};
use std::path::PathBuf;

/// Regular grammar and finite automaton toolkit
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print every intermediate step
    #[arg(long, global = true)]
    trace: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate strings from a grammar, classify it and convert it to an automaton
    Grammar {
        /// Grammar file (`A -> aB | a | ε` rules, or a .json definition)
        file: PathBuf,

        /// Number of strings to generate
        #[arg(short, long, default_value_t = 5)]
        count: usize,

        /// Strings to test for membership
        #[arg(long = "check")]
        checks: Vec<String>,

        /// Maximum recursion depth while generating
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Inspect an automaton: determinism, subset construction and grammar
    Automaton {
        /// Automaton definition (.json)
        file: PathBuf,

        /// Strings to test for membership
        #[arg(long = "check")]
        checks: Vec<String>,
    },
    /// Run the built-in grammar and automaton examples
    Demo,
}

/// Prints trace events as they happen
#[derive(Debug)]
struct ConsoleObserver;

impl TraceObserver for ConsoleObserver {
    fn observe(&self, event: &TraceEvent) {
        println!("    · {}", event);
    }

    fn name(&self) -> &str {
        "console"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let observer: Box<dyn TraceObserver> = if cli.trace {
        Box::new(ConsoleObserver)
    } else {
        Box::new(NoopObserver)
    };

    match cli.command {
        Commands::Grammar {
            file,
            count,
            checks,
            max_depth,
        } => {
            println!("Loading grammar from {}...", file.display());
            let mut grammar = load_grammar(&file)?;
            if let Some(max_recursion_depth) = max_depth {
                grammar.set_config(GrammarConfig {
                    max_recursion_depth,
                });
            }
            run_grammar(&grammar, count, &checks, observer.as_ref());
        }
        Commands::Automaton { file, checks } => {
            println!("Loading automaton from {}...", file.display());
            let automaton = load_automaton(&file)?;
            run_automaton(&automaton, &checks, observer.as_ref());
        }
        Commands::Demo => {
            let grammar = GrammarBuilder::new('S')
                .add_rule('S', "aD")
                .add_rule('D', "bE")
                .add_rules('E', &["cF", "dL"])
                .add_rule('F', "dD")
                .add_rules('L', &["aL", "bL", "c"])
                .build()?;
            let checks: Vec<String> = ["abcd", "abdc", "abc", "adc", "abbbbc"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            run_grammar(&grammar, 5, &checks, observer.as_ref());

            let automaton = AutomatonBuilder::<String>::new("q0")
                .final_state("q3")
                .transition("q0", 'a', "q1")
                .transition("q1", 'a', "q1")
                .transition("q1", 'b', "q2")
                .transition("q2", 'b', "q2")
                .transition("q2", 'b', "q3")
                .transition("q3", 'a', "q1")
                .build()?;
            let checks: Vec<String> = ["a", "ab", "abb", "abba", "abbab", "abbabbabba"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            run_automaton(&automaton, &checks, observer.as_ref());
        }
    }

    Ok(())
}

fn run_grammar(grammar: &Grammar, count: usize, checks: &[String], observer: &dyn TraceObserver) {
    println!("\n=== Grammar ===\n{}", grammar);
    println!("Classification: {}", grammar.classify());

    println!("\n=== Generating {} strings ===", count);
    let mut rng = rand::thread_rng();
    for i in 0..count {
        match grammar.generate_traced(&mut rng, observer) {
            Ok(text) => println!("{}. '{}'", i + 1, text),
            Err(err) => println!("{}. no string produced: {}", i + 1, err),
        }
    }

    let automaton = grammar.to_automaton();
    println!("\n=== Equivalent automaton ===\n{}", automaton);
    check_strings(&automaton, checks, observer);
}

fn run_automaton(automaton: &FiniteAutomaton, checks: &[String], observer: &dyn TraceObserver) {
    println!("\n=== Automaton ===\n{}", automaton);
    match automaton.nondeterminism() {
        None => println!("Is Deterministic: true"),
        Some(reason) => println!("Is Deterministic: false ({})", reason),
    }

    let grammar = automaton.to_grammar();
    println!("\n=== Equivalent grammar ===\n{}", grammar);
    println!("Classification: {}", grammar.classify());

    check_strings(automaton, checks, observer);

    if !automaton.is_deterministic() {
        let dfa = automaton.to_dfa_traced(observer);
        println!("\n=== Converted DFA ===\n{}", dfa);
        check_strings(&dfa, checks, observer);
    }
}

fn check_strings<S>(automaton: &FiniteAutomaton<S>, checks: &[String], observer: &dyn TraceObserver)
where
    S: Ord + Clone + std::fmt::Display,
{
    if checks.is_empty() {
        return;
    }
    println!("=== Checking strings ===");
    for input in checks {
        let belongs = automaton.accepts_traced(input, observer);
        println!("'{}' belongs to language: {}", input, belongs);
    }
}
