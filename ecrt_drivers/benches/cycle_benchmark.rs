//! Cycle benchmark — one full read/write pass per driver over a synthetic
//! process image. The cyclic path must stay far below the bus period
//! (typically 1 ms), with no allocation.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use ecrt_common::image;
use ecrt_drivers::devices::encoder::{EncoderDriver, EncoderPdos};
use ecrt_drivers::devices::servo::{ServoDriver, ServoPdos};
use ecrt_drivers::driver::{CycleInfo, CyclicDriver};
use ecrt_drivers::ds402::StatusWord;
use ecrt_common::image::PdoOffset;

const PERIOD_NS: i64 = 1_000_000;

fn bench_servo_cycle(c: &mut Criterion) {
    let pdos = ServoPdos {
        error_code: 0,
        status: 2,
        modes_display: 4,
        curr_pos: 6,
        curr_ferr: 10,
        din: 14,
        control: 18,
        modes: 20,
        target_pos: 22,
    };
    let mut drv = ServoDriver::new(pdos, true, 100_000_000);
    drv.commands.enable = true;
    drv.commands.pos_scale = 5.0;

    let mut pd = [0u8; 26];
    image::write_u16(
        &mut pd,
        2,
        (StatusWord::READY_TO_SWITCH_ON | StatusWord::SWITCHED_ON | StatusWord::OPERATION_ENABLED)
            .bits(),
    );

    let mut pos: i32 = 0;
    c.bench_function("servo_full_cycle", |b| {
        b.iter(|| {
            pos = pos.wrapping_add(37);
            image::write_i32(&mut pd, 6, pos);
            drv.commands.pos_cmd += 0.001;
            drv.read(black_box(&pd), CycleInfo::operational(PERIOD_NS));
            drv.write(black_box(&mut pd));
            black_box(drv.observations.pos)
        })
    });
}

fn bench_encoder_cycle(c: &mut Criterion) {
    let pdos = EncoderPdos {
        latch_valid: PdoOffset::bit(0, 0),
        set_counter_done: PdoOffset::bit(0, 2),
        frequency_error: PdoOffset::bit(0, 3),
        amplitude_error: PdoOffset::bit(0, 4),
        input_c_status: PdoOffset::bit(1, 2),
        sync_error: PdoOffset::bit(1, 5),
        txpdo_error: PdoOffset::bit(1, 6),
        txpdo_state: PdoOffset::bit(1, 7),
        count: 2,
        latch_value: 6,
        enable_latch: PdoOffset::bit(16, 0),
        set_counter: PdoOffset::bit(16, 2),
        set_counter_value: 18,
    };
    let mut drv = EncoderDriver::new(pdos);
    drv.commands.pos_scale = 360.0;

    let mut pd = [0u8; 32];
    let mut count: i32 = 0;
    c.bench_function("encoder_full_cycle", |b| {
        b.iter(|| {
            count = count.wrapping_add(13);
            image::write_i32(&mut pd, 2, count);
            drv.read(black_box(&pd), CycleInfo::operational(PERIOD_NS));
            drv.write(black_box(&mut pd));
            black_box(drv.observations.pos)
        })
    });
}

criterion_group!(benches, bench_servo_cycle, bench_encoder_cycle);
criterion_main!(benches);
