use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gitpane::git::{parse_branch_output, parse_log, parse_status_output};
use gitpane::AssetLayout;

// Sample git outputs for realistic benchmarking
const SMALL_STATUS: &str = " M Assets/Scenes/Main.unity
M  Assets/Scenes/Main.unity.meta
?? Assets/Textures/new.png";

const MIXED_STATUS: &str = " M README.md
M  Assets/Scripts/Player.cs
MM Assets/Scripts/Enemy.cs
A  Assets/Scripts/Boss.cs
A  Assets/Scripts/Boss.cs.meta
 D Assets/Old.prefab
 D Assets/Old.prefab.meta
R  Assets/Mat.mat -> Assets/Materials/Mat.mat
UU ProjectSettings/TagManager.asset
?? \"Assets/Audio/main theme.ogg\"
?? Assets/Generated/";

fn generate_status(num_files: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        output.push_str(&format!(" M Assets/Prefabs/Item_{}.prefab\n", i));
        output.push_str(&format!(" M Assets/Prefabs/Item_{}.prefab.meta\n", i));
    }
    output
}

fn generate_log(num_commits: usize) -> String {
    let mut output = String::new();
    for i in 0..num_commits {
        output.push_str(&format!(
            "{}|Commit message {}|{:07x}|Developer {}\n",
            1_620_000_000 + i * 60,
            i,
            i,
            i % 5
        ));
    }
    output
}

const BRANCH_OUTPUT: &str = "  develop     1a2b3c4 [origin/develop: behind 12] Merge branch
  experiment  5d6e7f8 Try new lighting
* main        a1b2c3d [origin/main: ahead 2, behind 1] Fix build
  release     9f8e7d6 [origin/release] Release 1.0";

fn bench_parse_status(c: &mut Criterion) {
    let layout = AssetLayout::default();
    let mut group = c.benchmark_group("parse_status_output");

    group.bench_with_input(BenchmarkId::new("small", "3 files"), &SMALL_STATUS, |b, input| {
        b.iter(|| parse_status_output(black_box(input), false, &layout))
    });

    group.bench_with_input(BenchmarkId::new("mixed", "11 files"), &MIXED_STATUS, |b, input| {
        b.iter(|| parse_status_output(black_box(input), false, &layout))
    });

    let large_status = generate_status(500);
    group.bench_with_input(BenchmarkId::new("large", "1000 files"), &large_status, |b, input| {
        b.iter(|| parse_status_output(black_box(input), false, &layout))
    });

    group.bench_with_input(
        BenchmarkId::new("name_only", "1000 files"),
        &large_status,
        |b, input| b.iter(|| parse_status_output(black_box(input), true, &layout)),
    );

    group.finish();
}

fn bench_parse_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_log");

    let small_log = generate_log(3);
    group.bench_with_input(BenchmarkId::new("small", "3 commits"), &small_log, |b, input| {
        b.iter(|| parse_log(black_box(input)))
    });

    let large_log = generate_log(500);
    group.bench_with_input(BenchmarkId::new("large", "500 commits"), &large_log, |b, input| {
        b.iter(|| parse_log(black_box(input)))
    });

    group.finish();
}

fn bench_parse_branch_output(c: &mut Criterion) {
    c.bench_function("parse_branch_output", |b| {
        b.iter(|| parse_branch_output(black_box(BRANCH_OUTPUT)))
    });
}

criterion_group!(
    benches,
    bench_parse_status,
    bench_parse_log,
    bench_parse_branch_output
);
criterion_main!(benches);
