use std::cell::RefCell;
use std::io::{self, Cursor};
use std::rc::Rc;

use astrum::{Config, Session};
use criterion::{criterion_group, criterion_main, Criterion};

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../tests/programs/fib.astr");

    c.bench_function("fib 20", |b| {
        b.iter(|| {
            let config = Config::new()
                .prelude(false)
                .stdout(Rc::new(RefCell::new(io::sink())))
                .stdin(Rc::new(RefCell::new(Cursor::new(Vec::new()))));
            let mut session = Session::new(config);
            session.run(src).unwrap();
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark
}
criterion_main!(benches);
