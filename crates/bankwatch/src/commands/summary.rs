//! Summary command: headline device and branch counts.

use bankwatch_core::{Controller, DashboardSummary};

use crate::cli::{GlobalOpts, OutputFormat, SummaryArgs};
use crate::error::CliError;
use crate::output;

fn detail(s: &DashboardSummary) -> String {
    let online = s
        .online_percentage()
        .map_or_else(|| "-".to_owned(), |pct| format!("{pct}%"));
    [
        format!("Devices:     {}", s.total_devices),
        format!("  Online:    {} ({online})", s.online_devices),
        format!("  Offline:   {}", s.offline_devices),
        format!("Branches:    {}", s.total_branches),
        format!("Customers:   {}", s.total_customers),
        format!(
            "Updated:     {}",
            s.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    ]
    .join("\n")
}

fn render(summary: &DashboardSummary, global: &GlobalOpts) -> Result<String, CliError> {
    output::render_single(&global.output, summary, detail, |s| {
        format!(
            "{} {} {} {} {}",
            s.total_devices,
            s.online_devices,
            s.offline_devices,
            s.total_branches,
            s.total_customers
        )
    })
}

pub async fn handle(
    controller: &Controller,
    args: &SummaryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let summary = match controller.summary() {
        Some(summary) => summary,
        None => controller.refresh_summary().await?,
    };
    output::print_output(&render(&summary, global)?, global.quiet);

    if !args.watch {
        return Ok(());
    }

    let mut rx = controller.subscribe_summary();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = rx.borrow_and_update().clone();
                if let Some(summary) = latest {
                    if matches!(global.output, OutputFormat::Table) {
                        println!();
                    }
                    output::print_output(&render(&summary, global)?, global.quiet);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn detail_shows_online_share() {
        let summary = DashboardSummary {
            total_devices: 4,
            online_devices: 3,
            offline_devices: 1,
            total_branches: 2,
            total_customers: 1,
            last_updated: Utc::now(),
        };
        let text = detail(&summary);
        assert!(text.contains("Online:    3 (75%)"));
        assert!(text.contains("Branches:    2"));
    }

    #[test]
    fn detail_handles_no_devices() {
        let summary = DashboardSummary {
            total_devices: 0,
            online_devices: 0,
            offline_devices: 0,
            total_branches: 0,
            total_customers: 0,
            last_updated: Utc::now(),
        };
        assert!(detail(&summary).contains("Online:    0 (-)"));
    }
}
