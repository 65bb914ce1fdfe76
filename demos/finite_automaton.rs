use regular_lab::{AutomatonBuilder, EventRecorder};
use std::error::Error;

/// Example of inspecting a non-deterministic automaton, converting it to a
/// DFA and to a regular grammar
fn main() -> Result<(), Box<dyn Error>> {
    let nfa = AutomatonBuilder::<String>::new("q0")
        .final_state("q3")
        .transition("q0", 'a', "q1")
        .transition("q1", 'a', "q1")
        .transition("q1", 'b', "q2")
        .transition("q2", 'b', "q2")
        .transition("q2", 'b', "q3")
        .transition("q3", 'a', "q1")
        .build()?;

    println!("{}", nfa);
    if let Some(reason) = nfa.nondeterminism() {
        println!("Not deterministic: {}\n", reason);
    }

    // Record the subset construction to show how composite states appear
    let recorder = EventRecorder::new();
    let dfa = nfa.to_dfa_traced(&recorder);
    for event in recorder.take() {
        println!("  {}", event);
    }
    println!("\n{}", dfa);

    let grammar = nfa.to_grammar();
    println!("{}", grammar);
    println!("Classification: {}\n", grammar.classify());

    for input in ["a", "ab", "abb", "abba", "abbab", "abbabbabba"] {
        println!(
            "'{}': NFA {}, DFA {}",
            input,
            nfa.accepts(input),
            dfa.accepts(input)
        );
    }

    Ok(())
}
