use crate::error::Result;
use crate::risk::RiskLevel;
use crate::view::TabDataView;

use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    tabs: &'a [TabDataView],
    highest_risk_level: Option<RiskLevel>,
}

/// Render tab views as a JSON report.
pub fn render(tabs: &[TabDataView]) -> Result<String> {
    let report = JsonReport {
        tabs,
        highest_risk_level: tabs.iter().map(|t| t.risk_level).max(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}
