//! Criterion benchmarks for the hot path of every relayed key edge:
//! pairing lookup, packet encoding, and controller-side reassembly.
//!
//! Run with:
//! ```bash
//! cargo bench --package keyrelay-core --bench packet_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keyrelay_core::keymap::VK_RETURN;
use keyrelay_core::{
    DeviceId, KeyTransition, Packet, PacketAssembler, PairingCoordinator, RoutingDecision,
};

const P1: DeviceId = DeviceId::from_raw(0x1001);
const P2: DeviceId = DeviceId::from_raw(0x1002);

fn paired_coordinator() -> PairingCoordinator {
    let mut coord = PairingCoordinator::default();
    coord.observe(&KeyTransition::press(P1, VK_RETURN));
    coord.observe(&KeyTransition::press(P2, VK_RETURN));
    coord
}

fn bench_observe(c: &mut Criterion) {
    let mut coord = paired_coordinator();
    let t = KeyTransition::press(P2, 0x41);
    c.bench_function("pairing/observe_paired", |b| {
        b.iter(|| coord.observe(black_box(&t)))
    });
}

fn bench_route_and_encode(c: &mut Criterion) {
    let mut coord = paired_coordinator();
    let t = KeyTransition::release(P1, 0x141);
    c.bench_function("packet/route_and_encode", |b| {
        b.iter(|| match coord.observe(black_box(&t)) {
            RoutingDecision::Forward(player) => Some(Packet::from_transition(player, &t).to_bytes()),
            _ => None,
        })
    });
}

fn bench_assemble(c: &mut Criterion) {
    let stream: Vec<u8> = (0..256u16)
        .flat_map(|code| [1u8, (code & 0xFF) as u8, (code % 2) as u8])
        .collect();
    c.bench_function("assembler/256_packets", |b| {
        b.iter(|| {
            let mut asm = PacketAssembler::new();
            asm.extend(black_box(&stream)).len()
        })
    });
}

criterion_group!(benches, bench_observe, bench_route_and_encode, bench_assemble);
criterion_main!(benches);
