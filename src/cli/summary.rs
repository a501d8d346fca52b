use super::ui;
use crate::core::DashboardState;
use crate::core::loader::MetricsSource;
use crate::core::view::FundView;
use anyhow::Result;
use comfy_table::Cell;

impl FundView {
    pub fn display_as_table(&self) -> String {
        let summary = &self.summary;

        // Title and risk badge at top
        let mut output = format!(
            "{}\n{}\n{}\n\n",
            ui::style_text(&summary.title, ui::StyleType::Title),
            ui::style_text(summary.subtitle, ui::StyleType::Subtle),
            ui::style_risk(&summary.risk_badge.label, summary.risk_badge.tier)
        );

        let mut metrics = ui::new_styled_table();
        metrics.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        for line in &summary.metrics {
            metrics.add_row(vec![Cell::new(line.label), ui::tone_cell(&line.value, line.tone)]);
        }
        output.push_str(&metrics.to_string());
        output.push_str("\n\n");

        let mut kpis = ui::new_styled_table();
        kpis.set_header(vec![
            ui::header_cell("KPI"),
            ui::header_cell("Value"),
            ui::header_cell("Change"),
        ]);
        for tile in &self.kpis {
            kpis.add_row(vec![
                Cell::new(tile.label),
                ui::tone_cell(&tile.value, tile.tone),
                ui::tone_cell(&tile.delta.text, tile.delta.tone),
            ]);
        }
        output.push_str(&kpis.to_string());
        output.push_str("\n\n");

        let mut quarterly = ui::new_styled_table();
        quarterly.set_header(vec![
            ui::header_cell("Quarter"),
            ui::header_cell("Occupancy"),
            ui::header_cell("Annual Revenue"),
            ui::header_cell("Avg Rent/SF"),
            ui::header_cell("WALT (months)"),
            ui::header_cell("Vacant SF"),
        ]);
        for row in &self.quarterly {
            quarterly.add_row(vec![
                Cell::new(&row.quarter),
                ui::value_cell(&row.occupancy),
                ui::value_cell(&row.annual_revenue),
                ui::value_cell(&row.avg_rent_psf),
                ui::value_cell(&row.walt),
                ui::value_cell(&row.vacant_sf),
            ]);
        }
        output.push_str(&quarterly.to_string());

        if !self.insights.is_empty() {
            output.push_str(&format!(
                "\n\n{}\n",
                ui::style_text("Key Insights & Recommendations", ui::StyleType::Label)
            ));
            for insight in &self.insights {
                output.push_str(&format!(
                    "\n[{}] {}: {}\n  {} {}\n",
                    insight.kind,
                    ui::style_text(&insight.category, ui::StyleType::Label),
                    insight.message,
                    ui::style_text("Recommendation:", ui::StyleType::Subtle),
                    insight.recommendation
                ));
            }
        }

        output
    }
}

pub async fn run(source: &dyn MetricsSource) -> Result<()> {
    let dashboard = match super::load_with_spinner(source).await {
        DashboardState::Ready(dashboard) => dashboard,
        DashboardState::Failed(failure) => {
            super::print_failure(&failure);
            return Err(failure.into());
        }
    };

    let num_funds = dashboard.funds.len();
    for (i, fund) in dashboard.funds.iter().enumerate() {
        println!("{}", fund.display_as_table());
        if i < num_funds - 1 {
            ui::print_separator();
        }
    }
    println!(
        "\n{}",
        ui::style_text(
            &format!(
                "Generated {} | Data period {}",
                dashboard.generated_date, dashboard.data_period
            ),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
