use crate::risk::RiskLevel;
use crate::view::{Indicator, TabDataView};

/// Render tab views as panel-style console output, riskiest tabs first.
pub fn render(tabs: &[TabDataView]) -> String {
    let mut output = String::new();

    if tabs.is_empty() {
        output.push_str("\n  No monitored tabs.\n\n");
        return output;
    }

    let mut sorted: Vec<&TabDataView> = tabs.iter().collect();
    sorted.sort_by(|a, b| {
        b.risk_level
            .cmp(&a.risk_level)
            .then_with(|| a.tab_id.cmp(&b.tab_id))
    });

    output.push_str(&format!("\n  {} tab(s) monitored:\n\n", tabs.len()));

    for tab in &sorted {
        let level_tag = match tab.risk_level {
            RiskLevel::Red => "[RED]   ",
            RiskLevel::Yellow => "[YELLOW]",
            RiskLevel::Green => "[GREEN] ",
        };
        let site = tab.site.as_deref().unwrap_or("-");
        output.push_str(&format!(
            "  {} tab {} {} (score {:.1})\n",
            level_tag, tab.tab_id, site, tab.score
        ));

        let memory = if tab.memory_usage > 0.0 {
            format!("{:.2} MB", tab.memory_usage)
        } else {
            "N/A".to_string()
        };
        let wasm = if tab.wasm_detected { "Yes" } else { "No" };
        let rows = [
            ("cpu", format!("{:.0}", tab.cpu_activity_score), tab.indicators.cpu),
            ("memory", memory, tab.indicators.memory),
            ("network", tab.network_activity_level.to_string(), tab.indicators.network),
            ("workers", tab.worker_count.to_string(), tab.indicators.workers),
            ("wasm", wasm.to_string(), tab.indicators.wasm),
        ];
        for (label, value, indicator) in rows {
            output.push_str(&format!(
                "           {:<8} {:<12} {}\n",
                label,
                value,
                dot(indicator)
            ));
        }
        output.push_str(&format!(
            "           transfer sent {} B, received {} B\n",
            tab.data_sent, tab.data_received
        ));

        if tab.warnings.is_empty() {
            output.push_str("           No warnings\n");
        }
        for warning in &tab.warnings {
            output.push_str(&format!("           ! {}\n", warning));
        }
        output.push('\n');
    }

    output
}

fn dot(indicator: Indicator) -> &'static str {
    match indicator {
        Indicator::Red => "(red)",
        Indicator::Yellow => "(yellow)",
        Indicator::Green => "(green)",
    }
}
