use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use sweeper_core::{BoardGenerator, Difficulty, GameConfig, SeededGenerator};

const PRESETS: [Difficulty; 3] = [
    Difficulty::Beginner,
    Difficulty::Intermediate,
    Difficulty::Expert,
];

fn preset(difficulty: Difficulty) -> GameConfig {
    difficulty.preset().unwrap_or_default()
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for difficulty in PRESETS {
        let config = preset(difficulty);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", difficulty)),
            &config,
            |b, &config| {
                let mut generator = SeededGenerator::new(0x5eed);
                b.iter(|| generator.generate(black_box(config), black_box((3, 3))));
            },
        );
    }
    group.finish();
}

fn bench_first_reveal(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_reveal");
    for difficulty in PRESETS {
        let config = preset(difficulty);
        let board = SeededGenerator::new(0x5eed)
            .generate(config, (3, 3))
            .expect("preset fits its safe zone");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", difficulty)),
            &board,
            |b, board| {
                b.iter(|| {
                    let mut board = board.clone();
                    board.reveal(black_box((3, 3)))
                });
            },
        );
    }
    group.finish();
}

fn bench_full_board_check(c: &mut Criterion) {
    let config = preset(Difficulty::Expert);
    let mut board = SeededGenerator::new(7)
        .generate(config, (8, 15))
        .expect("preset fits its safe zone");
    board.reveal((8, 15));

    c.bench_function("check_win/expert", |b| b.iter(|| black_box(&board).check_win()));
}

criterion_group!(
    benches,
    bench_generate,
    bench_first_reveal,
    bench_full_board_check
);
criterion_main!(benches);
