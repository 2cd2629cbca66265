// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the authorization hot path.
//!
//! Every agent tool call goes through these checks, so they need to stay cheap.
//!
//! Run with: `cargo bench --bench authorize`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use warden::intercept::{Action, ActionInterceptor, CommandDenylist};
use warden::permissions::{
    matches, AllowedPaths, BoundWorkspace, CapabilityRecord, GlobPattern, PermissionRegistry,
    Registration, Role,
};

/// Benchmark single glob matches against representative patterns.
fn bench_glob_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("glob");
    group.throughput(Throughput::Elements(1));

    let cases = [
        ("literal", "src/main.rs", "src/main.rs"),
        ("star", "src/main.rs", "src/*.rs"),
        ("globstar", "src/backend/api/routes/users.rs", "src/backend/**"),
        ("globstar_middle", "a/b/c/d/e/.env", "**/.env"),
        ("miss", "docs/readme.md", "src/**/*.rs"),
    ];

    for (name, path, pattern) in cases {
        group.bench_with_input(BenchmarkId::new("uncompiled", name), &(path, pattern), |b, (p, pat)| {
            b.iter(|| matches(black_box(p), black_box(pat)));
        });

        let compiled = GlobPattern::new(pattern);
        group.bench_with_input(BenchmarkId::new("compiled", name), &path, |b, p| {
            b.iter(|| compiled.matches(black_box(p)));
        });
    }

    group.finish();
}

/// Benchmark the capability check for a scoped implementer.
fn bench_check_write(c: &mut Criterion) {
    let mut record = CapabilityRecord::new("bench", Role::Implementer);
    record.allowed_paths = AllowedPaths::only(["src/backend/**", "tests/backend/**"]);
    record.denied_paths = vec![GlobPattern::new("**/.env"), GlobPattern::new(".git/**")];
    record.bound_workspace = Some(BoundWorkspace::new("feat/api", "/work/warden-feat+api"));

    let mut group = c.benchmark_group("check_write");
    group.throughput(Throughput::Elements(1));

    group.bench_function("allowed_relative", |b| {
        b.iter(|| record.check_write(black_box("src/backend/server.rs")));
    });
    group.bench_function("allowed_absolute", |b| {
        b.iter(|| record.check_write(black_box("/work/warden-feat+api/src/backend/server.rs")));
    });
    group.bench_function("outside_ownership", |b| {
        b.iter(|| record.check_write(black_box("src/frontend/app.js")));
    });
    group.bench_function("explicitly_denied", |b| {
        b.iter(|| record.check_write(black_box("src/backend/.env")));
    });

    group.finish();
}

/// Benchmark the shell tripwire.
fn bench_denylist(c: &mut Criterion) {
    let denylist = CommandDenylist::new();
    let mut group = c.benchmark_group("denylist");

    group.bench_function("benign", |b| {
        b.iter(|| denylist.check(black_box("cargo test --workspace -- --nocapture")));
    });
    group.bench_function("redirect", |b| {
        b.iter(|| denylist.check(black_box("echo hello > notes.txt")));
    });
    group.bench_function("long_pipeline", |b| {
        let command = "git log --oneline | grep fix | awk '{print $1}' | head -n 20 | sort | uniq";
        b.iter(|| denylist.check(black_box(command)));
    });

    group.finish();
}

/// Benchmark a full interception through the registry.
fn bench_interceptor(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = PermissionRegistry::new();
    rt.block_on(async {
        registry
            .register(
                Registration::new("impl", Role::Implementer)
                    .with_allowed_paths(["src/backend/**"])
                    .bound_to(BoundWorkspace::new("feat/api", "/work/warden-feat+api")),
            )
            .await;
        registry
            .register(Registration::new("review", Role::Reviewer))
            .await;
    });
    let interceptor = ActionInterceptor::new(registry);

    let mut group = c.benchmark_group("interceptor");
    group.throughput(Throughput::Elements(1));

    let write = Action::write("src/backend/server.rs");
    group.bench_function("implementer_write", |b| {
        b.to_async(&rt)
            .iter(|| interceptor.authorize(black_box("impl"), black_box(&write)));
    });

    let shell = Action::shell("cat src/lib.rs | grep pub");
    group.bench_function("reviewer_shell", |b| {
        b.to_async(&rt)
            .iter(|| interceptor.authorize(black_box("review"), black_box(&shell)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_glob_matching,
    bench_check_write,
    bench_denylist,
    bench_interceptor,
);
criterion_main!(benches);
