use abacus_calculator::built_in::builtin_registry;
use abacus_calculator::catalog::parse_catalog;
use abacus_calculator::{CalculatorInputs, CalculatorRegistry};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn mortgage_inputs() -> CalculatorInputs {
    CalculatorInputs::new()
        .with("loanAmount", 300_000)
        .with("interestRate", 6.5)
        .with("loanTerm", 30)
        .with("propertyTax", 4_800)
}

fn invoke_benchmark(c: &mut Criterion) {
    let registry = builtin_registry();
    let inputs = mortgage_inputs();
    c.bench_function("invoke_mortgage_payment", |b| {
        b.iter(|| registry.invoke(black_box("mortgage-payment"), black_box(&inputs)))
    });

    let invalid = CalculatorInputs::new().with("loanAmount", -1);
    c.bench_function("invoke_rejected_inputs", |b| {
        b.iter(|| registry.invoke(black_box("mortgage-payment"), black_box(&invalid)))
    });
}

fn lookup_benchmark(c: &mut Criterion) {
    let mut registry = CalculatorRegistry::new();
    let mut catalog = String::new();
    for i in 0..1_000 {
        catalog.push_str(&format!(
            "[[calculator]]\nid = \"sum-{i}\"\nname = \"Sum {i}\"\ncategory = \"math\"\nformula = {{ type = \"sum\" }}\n\n"
        ));
    }
    for calculator in parse_catalog(&catalog).unwrap() {
        registry.register_module(calculator);
    }

    c.bench_function("lookup_1000_calculators", |b| {
        b.iter(|| registry.get(black_box("sum-500")).is_some())
    });
    c.bench_function("search_1000_calculators", |b| b.iter(|| registry.search(black_box("sum-99"))));
}

criterion_group!(benches, invoke_benchmark, lookup_benchmark);
criterion_main!(benches);
