use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phase_vm::lexer::Lexer;
use phase_vm::parser::Parser;
use phase_vm::runtime::{execute_program, Limits};
use phase_vm::run;

fn workload() -> String {
    let mut source = String::from(
        "SEED { PUSH \"a\" PUSH \"b\" PUSH \"c\" BIND \"mode\" \"fast\" WITNESS }\n",
    );
    source.push_str("CHURN { SATURATE { PUSH \"layer\" GATE depth < 64 } }\n");
    source.push_str("SETTLE { SATURATE { GATE unbound \"done\" INVERT BIND \"done\" \"yes\" } }\n");
    source.push_str("WRAP { INVERT WITNESS HALT }\n");
    source
}

fn bench_lexer(c: &mut Criterion) {
    let source = workload();
    c.bench_function("lexer_tokenization", |b| {
        b.iter(|| {
            Lexer::new(black_box(&source), 100_000, 4096)
                .tokenize()
                .unwrap()
        })
    });
}

fn bench_parser(c: &mut Criterion) {
    let source = workload();
    c.bench_function("parser_full_program", |b| {
        b.iter(|| {
            let tokens = Lexer::new(black_box(&source), 100_000, 4096)
                .tokenize()
                .unwrap();
            Parser::new(tokens, 32).parse().unwrap()
        })
    });
}

fn bench_executor(c: &mut Criterion) {
    let source = workload();
    let tokens = Lexer::new(&source, 100_000, 4096).tokenize().unwrap();
    let program = Parser::new(tokens, 32).parse().unwrap();
    let limits = Limits {
        max_stack: 4096,
        ..Default::default()
    };
    c.bench_function("executor_saturate_workload", |b| {
        b.iter(|| execute_program(black_box(&program), limits.clone()))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let source = workload();
    let limits = Limits {
        max_stack: 4096,
        trace_enabled: true,
        ..Default::default()
    };
    c.bench_function("run_end_to_end", |b| {
        b.iter(|| run(black_box(source.as_bytes()), &limits))
    });
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parser,
    bench_executor,
    bench_full_pipeline
);
criterion_main!(benches);
