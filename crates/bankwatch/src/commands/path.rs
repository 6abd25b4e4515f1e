//! Path command: the breadcrumb from root to an entity.

use tabled::Tabled;

use bankwatch_core::{BreadcrumbItem, Controller, EntityId};

use crate::cli::{GlobalOpts, OutputFormat, PathArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CrumbRow {
    #[tabled(rename = "Level")]
    level: usize,
    #[tabled(rename = "Type")]
    tier: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

pub async fn handle(
    controller: &Controller,
    args: &PathArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Names resolve only among resident entities; anything else is tried as an ID.
    let id = util::resolve_entity(controller, &args.id)
        .map_or_else(|_| EntityId::from(args.id.as_str()), |e| e.id.clone());
    let path = controller.breadcrumb(&id).await?;

    let out = match global.output {
        OutputFormat::Table => {
            let rows: Vec<CrumbRow> = path
                .iter()
                .enumerate()
                .map(|(level, item)| CrumbRow {
                    level,
                    tier: item.entity_type.label(),
                    name: item.name.clone(),
                    id: item.id.to_string(),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            format!("{}\n{table}", breadcrumb_line(&path))
        }
        OutputFormat::Plain => path
            .iter()
            .map(|item| item.id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => output::render_structured(structured, &path)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn breadcrumb_line(path: &[BreadcrumbItem]) -> String {
    path.iter()
        .map(|item| item.name.as_str())
        .collect::<Vec<_>>()
        .join(" › ")
}
