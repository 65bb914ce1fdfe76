use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regular_lab::{
    AutomatonBuilder, AutomatonDefinition, ChomskyType, Error, EventRecorder, FiniteAutomaton,
    Grammar, TraceEvent, load_automaton, load_grammar,
};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::thread;

/// Every string over `alphabet` of length at most `max_len`
fn all_strings(alphabet: &[char], max_len: usize) -> Vec<String> {
    let mut result = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for c in alphabet {
                let mut s = prefix.clone();
                s.push(*c);
                next.push(s);
            }
        }
        result.extend(next.iter().cloned());
        frontier = next;
    }
    result
}

fn assert_same_language<S, T>(a: &FiniteAutomaton<S>, b: &FiniteAutomaton<T>, alphabet: &[char])
where
    S: Ord + Clone + fmt::Display,
    T: Ord + Clone + fmt::Display,
{
    for input in all_strings(alphabet, 6) {
        assert_eq!(a.accepts(&input), b.accepts(&input), "disagree on {:?}", input);
    }
}

fn lab_automaton() -> FiniteAutomaton {
    AutomatonBuilder::<String>::new("q0")
        .final_state("q3")
        .transition("q0", 'a', "q1")
        .transition("q1", 'a', "q1")
        .transition("q1", 'b', "q2")
        .transition("q2", 'b', "q2")
        .transition("q2", 'b', "q3")
        .transition("q3", 'a', "q1")
        .build()
        .unwrap()
}

fn lab_grammar() -> Grammar {
    Grammar::from_rules_str(
        r#"
        S -> aD
        D -> bE
        E -> cF | dL
        F -> dD
        L -> aL | bL | c
        "#,
    )
    .unwrap()
}

/// A random automaton over {a, b}; each (state, symbol) pair gets a random
/// subset of the states as successors
fn random_automaton(rng: &mut StdRng, size: usize) -> FiniteAutomaton {
    let states: Vec<String> = (0..size).map(|i| format!("q{}", i)).collect();
    let mut transitions = Vec::new();
    for from in &states {
        for symbol in ['a', 'b'] {
            for to in &states {
                if rng.gen_bool(0.3) {
                    transitions.push((from.clone(), symbol, to.clone()));
                }
            }
        }
    }
    let finals: Vec<String> = states
        .iter()
        .filter(|_| rng.gen_bool(0.3))
        .cloned()
        .collect();

    FiniteAutomaton::new(states.clone(), ['a', 'b'], transitions, states[0].clone(), finals).unwrap()
}

#[test]
fn test_lab_automaton_scenario() {
    let fa = lab_automaton();
    assert!(!fa.is_deterministic());
    assert!(!fa.accepts("ab"));
    assert!(fa.accepts("abb"));

    let dfa = fa.to_dfa();
    for input in ["a", "ab", "abb", "abba", "abbab", "abbabbabba"] {
        assert_eq!(fa.accepts(input), dfa.accepts(input));
    }
}

#[test]
fn test_lab_grammar_scenario() {
    let fa = lab_grammar().to_automaton();

    assert!(fa.accepts("abdc"));
    assert!(fa.accepts("abcdbdc"));
    assert!(!fa.accepts("abc"));
    // S → aD → abE → abcF → abcdD: the derivation is left at D, which only
    // continues with bE, so "abcd" is not in the language
    assert!(!fa.accepts("abcd"));
    assert!(!fa.accepts("adc"));
    assert!(!fa.accepts("abbbbc"));
}

#[test]
fn test_epsilon_loop_is_regular() {
    let grammar = Grammar::from_rules_str("S -> aS | ε").unwrap();
    assert_eq!(grammar.classify(), ChomskyType::Type3);
}

#[test]
fn test_grammar_round_trip() {
    let grammars = [
        lab_grammar(),
        Grammar::from_rules_str("S -> aS | ε").unwrap(),
        Grammar::from_rules_str("S -> aA | b\nA -> bS | a").unwrap(),
        Grammar::from_rules_str("S -> aS | bA\nA -> aA | bS | ε").unwrap(),
    ];

    for grammar in &grammars {
        let alphabet: Vec<char> = grammar.terminals().iter().copied().collect();
        let direct = grammar.to_automaton();
        let round_trip = direct.to_grammar();
        assert_same_language(&direct, &round_trip.to_automaton(), &alphabet);

        let mut rng = StdRng::seed_from_u64(3);
        let converted = round_trip.to_automaton();
        for _ in 0..20 {
            let text = grammar.generate_with(&mut rng).unwrap();
            assert!(converted.accepts(&text), "round trip lost {:?}", text);
        }
    }
}

#[test]
fn test_automaton_round_trip_keeps_language() {
    let fa = lab_automaton();
    let grammar = fa.to_grammar();
    assert_same_language(&fa, &grammar.to_automaton(), &['a', 'b']);

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        let text = grammar.generate_with(&mut rng).unwrap();
        assert!(fa.accepts(&text), "{:?} not in the automaton's language", text);
    }
}

#[test]
fn test_subset_construction_properties() {
    let mut rng = StdRng::seed_from_u64(2024);
    for size in 1..=5 {
        for _ in 0..10 {
            let nfa = random_automaton(&mut rng, size);
            let dfa = nfa.to_dfa();
            let complete = nfa.to_complete_dfa();

            assert!(dfa.is_partial_dfa());
            assert!(complete.is_deterministic());
            assert_same_language(&nfa, &dfa, &['a', 'b']);
            assert_same_language(&nfa, &complete, &['a', 'b']);
        }
    }
}

#[test]
fn test_to_dfa_idempotent() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..10 {
        let dfa = random_automaton(&mut rng, 4).to_dfa();
        let again = dfa.to_dfa();

        assert_eq!(dfa.states().len(), again.states().len());
        assert_same_language(&dfa, &again, &['a', 'b']);
    }
}

#[test]
fn test_to_dfa_does_not_mutate_input() {
    let fa = lab_automaton();
    let before = fa.clone();
    let _ = fa.to_dfa();
    let _ = fa.to_grammar();
    assert_eq!(fa, before);
}

#[test]
fn test_classification_monotonic() {
    let grammars = [
        lab_grammar(),
        Grammar::from_rules_str("S -> aS | ε").unwrap(),
        Grammar::from_rules_str("S -> aA | b\nA -> bS | a").unwrap(),
    ];

    for grammar in &grammars {
        let classification = grammar.classification();
        assert_eq!(classification.most_specific(), ChomskyType::Type3);
        for ty in [ChomskyType::Type2, ChomskyType::Type1, ChomskyType::Type0] {
            assert!(classification.satisfies(ty), "{} fails {:?}", grammar, ty);
        }
    }
}

#[test]
fn test_derived_grammar_classification() {
    // Final states other than the start carry ε, which only the
    // unrestricted check allows
    assert_eq!(lab_automaton().to_grammar().classify(), ChomskyType::Type0);

    let accepts_empty = AutomatonBuilder::<String>::new("s")
        .final_state("s")
        .transition("s", 'a', "t")
        .transition("t", 'a', "s")
        .build()
        .unwrap();
    assert_eq!(accepts_empty.to_grammar().classify(), ChomskyType::Type3);
}

#[test]
fn test_generation_failure_is_reported() {
    let grammar = Grammar::from_rules_str("S -> aS").unwrap();
    let result = grammar.generate_with(&mut StdRng::seed_from_u64(0));
    assert!(matches!(
        result,
        Err(Error::GenerationDepthExceeded { depth: 100 })
    ));
}

#[test]
fn test_traced_generation() {
    let grammar = Grammar::from_rules_str("S -> aS | b").unwrap();
    let recorder = EventRecorder::new();
    let text = grammar
        .generate_traced(&mut StdRng::seed_from_u64(5), &recorder)
        .unwrap();

    let events = recorder.events();
    let applied = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::ProductionApplied { .. }))
        .count();
    assert_eq!(applied, text.len());
    assert_eq!(events.last(), Some(&TraceEvent::Generated { text }));
}

#[test]
fn test_concurrent_queries() {
    let fa = lab_automaton();
    let grammar = lab_grammar();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert!(fa.accepts("abb"));
                assert!(!fa.is_deterministic());
                assert_eq!(grammar.classify(), ChomskyType::Type3);
            });
        }
    });
}

#[test]
fn test_load_from_files() {
    let mut rules = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(rules, "# lab grammar").unwrap();
    writeln!(rules, "S -> aD\nD -> bE\nE -> cF | dL\nF -> dD\nL -> aL | bL | c").unwrap();
    let grammar = load_grammar(rules.path()).unwrap();
    assert_eq!(grammar, lab_grammar());

    let definition = AutomatonDefinition::from(&lab_automaton());
    let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    json.write_all(definition.to_json().unwrap().as_bytes()).unwrap();
    assert_eq!(load_automaton(json.path()).unwrap(), lab_automaton());
}

#[test]
fn test_demo_data_files() {
    let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("data");

    let grammar = load_grammar(data.join("lab1.grammar")).unwrap();
    assert_eq!(grammar, lab_grammar());

    let fa = load_automaton(data.join("lab2.json")).unwrap();
    assert_eq!(fa, lab_automaton());

    let json_grammar = load_grammar(data.join("lab1.json")).unwrap();
    assert_eq!(json_grammar, lab_grammar());
}
