use criterion::{Criterion, black_box, criterion_group, criterion_main};
use regular_lab::{AutomatonBuilder, FiniteAutomaton};

/// NFA for "the n-th symbol from the end is `a`"; its DFA has 2^n states
fn nth_from_end(n: usize) -> FiniteAutomaton {
    let mut builder = AutomatonBuilder::<String>::new("q0")
        .transition("q0", 'a', "q0")
        .transition("q0", 'b', "q0")
        .transition("q0", 'a', "q1")
        .final_state(format!("q{}", n));
    for i in 1..n {
        let (from, to) = (format!("q{}", i), format!("q{}", i + 1));
        builder = builder
            .transition(from.clone(), 'a', to.clone())
            .transition(from, 'b', to);
    }
    builder.build().expect("valid automaton")
}

fn bench_subset_construction(c: &mut Criterion) {
    let nfa = nth_from_end(8);
    c.bench_function("to_dfa nth_from_end(8)", |b| b.iter(|| black_box(&nfa).to_dfa()));

    let dfa = nfa.to_dfa();
    let input = "ab".repeat(64);
    c.bench_function("nfa accepts 128 symbols", |b| {
        b.iter(|| black_box(&nfa).accepts(black_box(&input)))
    });
    c.bench_function("dfa accepts 128 symbols", |b| {
        b.iter(|| black_box(&dfa).accepts(black_box(&input)))
    });
}

criterion_group!(benches, bench_subset_construction);
criterion_main!(benches);
