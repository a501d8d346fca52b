use super::ui;
use crate::core::DashboardState;
use crate::core::loader::MetricsSource;
use crate::core::view::ComparisonView;
use anyhow::Result;
use comfy_table::Cell;

impl ComparisonView {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Metric"),
            ui::header_cell("Fund 2"),
            ui::header_cell("Fund 3"),
            ui::header_cell("Difference"),
        ]);

        for row in &self.rows {
            table.add_row(vec![
                Cell::new(row.metric),
                ui::value_cell(&row.fund2),
                ui::value_cell(&row.fund3),
                ui::tone_cell(&row.difference, row.tone()),
            ]);
        }

        format!(
            "{}\n{}\n\n{}",
            ui::style_text(&self.title, ui::StyleType::Title),
            ui::style_text("Side-by-side performance analysis", ui::StyleType::Subtle),
            table
        )
    }
}

pub async fn run(source: &dyn MetricsSource) -> Result<()> {
    match super::load_with_spinner(source).await {
        DashboardState::Ready(dashboard) => {
            println!("{}", dashboard.comparison.display_as_table());
            Ok(())
        }
        DashboardState::Failed(failure) => {
            super::print_failure(&failure);
            Err(failure.into())
        }
    }
}
