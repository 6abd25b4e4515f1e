//! Entity command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use bankwatch_core::{
    ColumnKey, Command as CoreCommand, CommandResult, Controller, CreateEntityRequest, Entity,
    HierarchyNode, TableView, UpdateEntityRequest, display_fields,
};

use crate::cli::{
    AddEntityArgs, ChildrenArgs, EditEntityArgs, EntitiesArgs, EntitiesCommand, EntityListArgs,
    GlobalOpts, OutputFormat, SortColumn,
};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    tier: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Parent")]
    parent: String,
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.to_string(),
            tier: e.entity_type.label(),
            name: e.name.clone(),
            parent: e
                .parent_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

fn detail(controller: &Controller, e: &Entity) -> String {
    let forest = controller.forest();
    let path = forest
        .resolve_path(&e.id)
        .map(|p| {
            p.iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(" › ")
        })
        .unwrap_or_default();
    let children = forest.find(&e.id).map_or(0, |n| n.child_count);
    let child_tier = controller
        .child_type(&e.id)
        .map_or("-", |t| t.label());

    let mut out = [
        format!("ID:          {}", e.id),
        format!("Type:        {}", e.entity_type.label()),
        format!("Name:        {}", e.name),
        format!("Path:        {path}"),
        format!("Children:    {children}"),
        format!("Child type:  {child_tier}"),
    ]
    .join("\n");

    for key in display_fields(e.entity_type) {
        if let Some(value) = e.metadata.get(key) {
            let _ = write!(out, "\n{:<13}{value}", format!("{key}:"));
        }
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: EntitiesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EntitiesCommand::List(list) => handle_list(controller, &list, global),

        EntitiesCommand::Get { id } => {
            let entity = util::resolve_entity(controller, &id)?;
            let out = output::render_single(
                &global.output,
                entity.as_ref(),
                |e| detail(controller, e),
                |e| e.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EntitiesCommand::Children(children) => handle_children(controller, &children, global),

        EntitiesCommand::Add(add) => handle_add(controller, add, global).await,

        EntitiesCommand::Edit(edit) => handle_edit(controller, edit, global).await,

        EntitiesCommand::Delete { id } => {
            let entity = util::resolve_entity(controller, &id)?;
            if !util::confirm(
                &format!(
                    "Delete {} '{}'? This cannot be undone.",
                    entity.entity_type.label(),
                    entity.name
                ),
                global.yes,
            )? {
                return Ok(());
            }
            controller
                .execute(CoreCommand::DeleteEntity {
                    id: entity.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("{} '{}' deleted", entity.entity_type.label(), entity.name);
            }
            Ok(())
        }
    }
}

fn handle_list(
    controller: &Controller,
    list: &EntityListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let wanted = list
        .entity_type
        .as_deref()
        .map(util::parse_entity_type)
        .transpose()?;
    let needle = list.search.as_deref().map(str::to_lowercase);

    let forest = controller.forest();
    let entities: Vec<Entity> = forest
        .iter()
        .map(|node| node.entity.as_ref().clone())
        .filter(|e| wanted.is_none_or(|t| e.entity_type == t))
        .filter(|e| {
            needle
                .as_deref()
                .is_none_or(|n| e.name.to_lowercase().contains(n))
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entities,
        |e| EntityRow::from(e),
        |e| e.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn sort_key(column: SortColumn) -> ColumnKey {
    match column {
        SortColumn::Name => ColumnKey::Name,
        SortColumn::Type => ColumnKey::Type,
        SortColumn::Status => ColumnKey::Status,
        SortColumn::LastActive => ColumnKey::LastActive,
        SortColumn::Children => ColumnKey::ChildCount,
    }
}

fn handle_children(
    controller: &Controller,
    args: &ChildrenArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity = util::resolve_entity(controller, &args.id)?;
    let forest = controller.forest();
    let node: &HierarchyNode = forest.find(&entity.id).ok_or_else(|| CliError::DataIntegrity {
        message: format!("{} is not reachable from any root", entity.id),
    })?;
    let config = controller.store().config_for(&entity.id);

    let mut view = TableView::new(node, config.as_deref());
    if let Some(term) = &args.search {
        view.set_search(term.as_str());
    }
    if let Some(column) = args.sort {
        let key = sort_key(column);
        if !view.toggle_sort(key) {
            return Err(CliError::Validation {
                field: "sort".into(),
                reason: format!("this listing cannot be sorted by {key}"),
            });
        }
        if args.desc {
            view.toggle_sort(key);
        }
    }

    let out = match global.output {
        OutputFormat::Table => {
            let color = output::should_color(&global.color);
            let headers: Vec<String> = view.columns().iter().map(|c| c.label.clone()).collect();
            let status_col = view.columns().iter().position(|c| c.key == ColumnKey::Status);
            let mut cells = view.cells();
            if let Some(col) = status_col {
                for row in &mut cells {
                    if let Some(cell) = row.get_mut(col) {
                        *cell = output::paint_status(cell, color);
                    }
                }
            }
            let shown = cells.len();
            format!(
                "{}\n{shown} of {} shown",
                output::render_dynamic_table(&headers, &cells),
                view.total()
            )
        }
        OutputFormat::Plain => view
            .rows()
            .iter()
            .map(|n| n.id().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => {
            let rows: Vec<serde_json::Value> = view
                .rows()
                .iter()
                .zip(view.cells())
                .map(|(node, cells)| {
                    let mut obj = serde_json::Map::new();
                    obj.insert("id".into(), node.id().to_string().into());
                    for (column, cell) in view.columns().iter().zip(cells) {
                        obj.insert(column.key.to_string(), cell.into());
                    }
                    serde_json::Value::Object(obj)
                })
                .collect();
            output::render_structured(structured, &rows)?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn handle_add(
    controller: &Controller,
    args: AddEntityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let parent = util::resolve_entity(controller, &args.parent)?;
    let entity_type = match args.entity_type.as_deref() {
        Some(raw) => util::parse_entity_type(raw)?,
        None => controller
            .child_type(&parent.id)
            .ok_or_else(|| CliError::Validation {
                field: "parent".into(),
                reason: format!(
                    "{} '{}' cannot have children",
                    parent.entity_type.label(),
                    parent.name
                ),
            })?,
    };
    let metadata =
        util::build_metadata(entity_type, None, &args.meta, args.from_file.as_deref())?;

    let result = controller
        .execute(CoreCommand::CreateEntity(CreateEntityRequest {
            parent_id: parent.id.clone(),
            entity_type,
            name: args.name,
            metadata,
        }))
        .await?;
    print_entity_result(controller, &result, global, "created")
}

async fn handle_edit(
    controller: &Controller,
    args: EditEntityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity = util::resolve_entity(controller, &args.id)?;
    let metadata = if args.meta.is_empty() && args.from_file.is_none() {
        None
    } else {
        Some(util::build_metadata(
            entity.entity_type,
            Some(&entity.metadata),
            &args.meta,
            args.from_file.as_deref(),
        )?)
    };

    let result = controller
        .execute(CoreCommand::UpdateEntity {
            id: entity.id.clone(),
            update: UpdateEntityRequest {
                name: args.name,
                metadata,
            },
        })
        .await?;
    print_entity_result(controller, &result, global, "updated")
}

fn print_entity_result(
    controller: &Controller,
    result: &CommandResult,
    global: &GlobalOpts,
    verb: &str,
) -> Result<(), CliError> {
    let CommandResult::Entity(entity) = result else {
        return Ok(());
    };
    if !global.quiet {
        eprintln!("{} '{}' {verb}", entity.entity_type.label(), entity.name);
    }
    let out = output::render_single(
        &global.output,
        entity,
        |e| detail(controller, e),
        |e| e.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
