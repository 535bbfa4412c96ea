use criterion::{Criterion, black_box, criterion_group, criterion_main};
use listcomp::batch::refactor_files;
use listcomp::refactor_for_loop;
use std::fs;
use tempfile::TempDir;

/// A realistic module: imports, helpers and a class ahead of the
/// accumulator loop, so the parser does real work before the match.
fn make_python_file(index: usize) -> String {
    format!(
        r#"
import os
import sys
from pathlib import Path

CONSTANT_{i} = {i}

def helper_{i}(x, y=2, *args, **kwargs):
    if x > y and not args:
        return x ** 2 + y
    elif kwargs:
        return {{k: v for k, v in kwargs.items() if v}}
    return [a * b for a in args for b in range(y)]

class Model_{i}(Base):
    scale: float = 1.5

    def compute(self, values):
        return sum(v * self.scale for v in values)

squares_{i} = []
for n in range (0, CONSTANT_{i} + 10):
    squares_{i}.append(helper_{i}(n, y=3) - n % 7)

print(os.path.join("a", "b"), sys.version, Path("."))
"#,
        i = index
    )
}

fn bench_refactor(c: &mut Criterion) {
    let source = make_python_file(0);
    c.bench_function("refactor_single_module", |b| {
        b.iter(|| black_box(refactor_for_loop(black_box(&source)).unwrap()));
    });

    // Matching stops early, but the whole file must still parse.
    let big_source: String = (0..200)
        .map(make_python_file)
        .collect::<Vec<_>>()
        .join("\n");
    c.bench_function("refactor_single_large_file", |b| {
        b.iter(|| black_box(refactor_for_loop(black_box(&big_source)).unwrap()));
    });

    // Build a temporary corpus of 50 Python files.
    let dir = TempDir::new().unwrap();
    let mut files = Vec::new();
    for i in 0..50 {
        let path = dir.path().join(format!("module_{i}.py"));
        fs::write(&path, make_python_file(i)).unwrap();
        files.push(path);
    }
    c.bench_function("refactor_files_50_modules", |b| {
        b.iter(|| black_box(refactor_files(black_box(&files))));
    });
}

criterion_group!(benches, bench_refactor);
criterion_main!(benches);
