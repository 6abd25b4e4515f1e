//! Customer command handlers.

use serde::Serialize;
use tabled::Tabled;

use bankwatch_core::model::hierarchy_config::parse_levels;
use bankwatch_core::{
    Command as CoreCommand, CommandResult, Controller, CreateCustomerRequest, EntityType,
    HierarchyConfig, HierarchyNode, Metadata,
};

use crate::cli::{CustomersArgs, CustomersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// A customer with the shape its subtree follows.
#[derive(Serialize)]
struct CustomerView {
    id: String,
    name: String,
    levels: Vec<EntityType>,
    children: usize,
    metadata: Metadata,
}

impl CustomerView {
    fn new(node: &HierarchyNode, config: Option<&HierarchyConfig>) -> Self {
        Self {
            id: node.id().to_string(),
            name: node.name().to_owned(),
            levels: config.map_or_else(
                || HierarchyConfig::DEFAULT_LEVELS.to_vec(),
                |c| c.levels.clone(),
            ),
            children: node.child_count,
            metadata: node.entity.metadata.clone(),
        }
    }
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Levels")]
    levels: String,
    #[tabled(rename = "Children")]
    children: usize,
}

impl From<&CustomerView> for CustomerRow {
    fn from(v: &CustomerView) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            levels: levels_label(&v.levels),
            children: v.children,
        }
    }
}

/// `Customer → Zone → Branch → Device`
fn levels_label(levels: &[EntityType]) -> String {
    std::iter::once(EntityType::Customer)
        .chain(levels.iter().copied())
        .chain(std::iter::once(EntityType::Device))
        .map(EntityType::label)
        .collect::<Vec<_>>()
        .join(" → ")
}

pub async fn handle(
    controller: &Controller,
    args: CustomersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CustomersCommand::List => {
            let forest = controller.forest();
            let store = controller.store();
            let customers: Vec<CustomerView> = forest
                .customers()
                .map(|node| CustomerView::new(node, store.config_for(node.id()).as_deref()))
                .collect();
            let out = output::render_list(
                &global.output,
                &customers,
                |v| CustomerRow::from(v),
                |v| v.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CustomersCommand::Add { name, levels, meta } => {
            let levels = parse_levels(&levels)?;
            let metadata = util::build_metadata(EntityType::Customer, None, &meta, None)?;
            let result = controller
                .execute(CoreCommand::CreateCustomer(CreateCustomerRequest {
                    name,
                    metadata,
                    levels,
                }))
                .await?;

            if let CommandResult::Customer { customer, config } = result {
                if !global.quiet {
                    eprintln!("Customer '{}' created", customer.name);
                }
                let view = CustomerView {
                    id: customer.id.to_string(),
                    name: customer.name,
                    levels: config.levels,
                    children: 0,
                    metadata: customer.metadata,
                };
                let out = output::render_single(
                    &global.output,
                    &view,
                    |v| {
                        format!(
                            "ID:      {}\nName:    {}\nLevels:  {}",
                            v.id,
                            v.name,
                            levels_label(&v.levels)
                        )
                    },
                    |v| v.id.clone(),
                )?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
    }
}
