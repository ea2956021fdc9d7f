use crate::risk::{Factor, FactorMetadata};
use crate::state::TabState;

/// WebAssembly: 10 points once the page has instantiated a module.
pub struct WasmFactor;

impl Factor for WasmFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "WASM".into(),
            name: "WebAssembly".into(),
            description: "The page instantiated WebAssembly".into(),
            cap: 10.0,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        if state.wasm_detected {
            10.0
        } else {
            0.0
        }
    }
}
