mod cpu;
mod memory;
mod network;
mod transfer;
mod wasm;
mod workers;

use super::Factor;

/// Returns all built-in factors in scoring order.
pub fn all_factors() -> Vec<Box<dyn Factor>> {
    vec![
        Box::new(cpu::CpuFactor),
        Box::new(memory::MemoryFactor),
        Box::new(network::NetworkFactor),
        Box::new(transfer::TransferFactor),
        Box::new(workers::WorkerFactor),
        Box::new(wasm::WasmFactor),
    ]
}
