use regular_lab::{Grammar, GrammarBuilder, GrammarConfig};
use std::error::Error;

/// Example of generating strings from a regular grammar and checking
/// membership through the equivalent automaton
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: Build the grammar programmatically
    let grammar = GrammarBuilder::new('S')
        .add_rule('S', "aD")
        .add_rule('D', "bE")
        .add_rules('E', &["cF", "dL"])
        .add_rule('F', "dD")
        .add_rules('L', &["aL", "bL", "c"])
        .build()?;

    println!("{}", grammar);
    println!("Classification: {}\n", grammar.classify());

    println!("Generated strings:");
    for i in 1..=5 {
        println!("{}. {}", i, grammar.generate()?);
    }

    let automaton = grammar.to_automaton();
    println!("\nEquivalent automaton:\n{}", automaton);
    for input in ["abcd", "abdc", "abc", "adc", "abbbbc"] {
        println!("'{}' belongs to language: {}", input, automaton.accepts(input));
    }

    // Example 2: Parse rules from text, with a tight recursion limit
    let grammar: Grammar = "S -> aS | bS | c".parse()?;
    let grammar = grammar.with_config(GrammarConfig {
        max_recursion_depth: 4,
    });

    println!("\nShort strings only (depth limit 4):");
    for i in 1..=5 {
        match grammar.generate() {
            Ok(text) => println!("{}. {}", i, text),
            Err(err) => println!("{}. {}", i, err),
        }
    }

    Ok(())
}
