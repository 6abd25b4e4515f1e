//! Tree command: the forest as indented text.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use bankwatch_core::{Controller, EntityType, HierarchyNode};

use crate::cli::{GlobalOpts, OutputFormat, TreeArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(
    controller: &Controller,
    args: &TreeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let forest = controller.forest();

    let mut nodes: Vec<HierarchyNode> = match &args.root {
        Some(root) => {
            let entity = util::resolve_entity(controller, root)?;
            forest.find(&entity.id).cloned().into_iter().collect()
        }
        None => forest.roots().to_vec(),
    };
    if let Some(term) = args.search.as_deref() {
        nodes = nodes.iter().filter_map(|n| n.filter(term)).collect();
    }
    if let Some(depth) = args.depth {
        for node in &mut nodes {
            prune(node, depth);
        }
    }

    let out = match global.output {
        OutputFormat::Table => {
            let color = output::should_color(&global.color);
            let mut text = render(&nodes, color);
            let report = forest.report();
            if !report.orphans.is_empty() && args.root.is_none() {
                let _ = write!(
                    text,
                    "\n{} entities reference a missing parent and are shown as roots",
                    report.orphans.len()
                );
            }
            text
        }
        OutputFormat::Plain => nodes
            .iter()
            .flat_map(HierarchyNode::walk)
            .map(|n| n.id().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        ref structured => output::render_structured(structured, &nodes)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Drop nodes more than `depth` levels below `node`.
fn prune(node: &mut HierarchyNode, depth: usize) {
    if depth == 0 {
        node.children.clear();
        return;
    }
    for child in &mut node.children {
        prune(child, depth - 1);
    }
}

fn render(nodes: &[HierarchyNode], color: bool) -> String {
    let mut out = String::new();
    for node in nodes {
        let _ = writeln!(out, "{}", label(node, color));
        render_children(&mut out, node, "", color);
    }
    out.trim_end().to_owned()
}

fn render_children(out: &mut String, node: &HierarchyNode, prefix: &str, color: bool) {
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", label(child, color));
        render_children(out, child, &format!("{prefix}{indent}"), color);
    }
}

fn label(node: &HierarchyNode, color: bool) -> String {
    let tier = format!("[{}]", node.entity_type().label());
    let tier = if color { tier.dimmed().to_string() } else { tier };

    let mut text = format!("{} {tier}", node.name());
    if node.entity_type() == EntityType::Device {
        let status = node
            .entity
            .metadata
            .as_device()
            .and_then(|d| d.status)
            .unwrap_or_default()
            .to_string();
        let _ = write!(text, " {}", output::paint_status(&status, color));
    } else if node.child_count > node.children.len() {
        // Pruned by --depth or --search.
        let _ = write!(text, " (+{})", node.child_count - node.children.len());
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bankwatch_core::{Entity, EntityId, Forest, Metadata, OrphanPolicy};

    use super::*;

    fn ent(id: &str, t: EntityType, parent: Option<&str>, name: &str) -> Entity {
        Entity {
            id: EntityId::from(id),
            entity_type: t,
            name: name.into(),
            parent_id: parent.map(EntityId::from),
            metadata: Metadata::empty(t),
            created_at: None,
            updated_at: None,
        }
    }

    fn forest() -> Forest {
        Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Acme"),
                ent("z2", EntityType::Zone, Some("c1"), "West"),
                ent("z1", EntityType::Zone, Some("c1"), "East"),
                ent("b1", EntityType::Branch, Some("z1"), "Colaba"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap()
    }

    #[test]
    fn renders_box_drawing_tree() {
        let text = render(forest().roots(), false);
        assert_eq!(
            text,
            "Acme [Customer]\n\
             ├── East [Zone]\n\
             │   └── Colaba [Branch]\n\
             └── West [Zone]"
        );
    }

    #[test]
    fn filtered_tree_notes_hidden_children() {
        let forest = forest();
        let kept = forest.roots()[0].filter("colaba").unwrap();
        let text = render(std::slice::from_ref(&kept), false);
        assert_eq!(
            text,
            "Acme [Customer] (+1)\n\
             └── East [Zone]\n    \
                 └── Colaba [Branch]"
        );
    }

    #[test]
    fn depth_prune_marks_hidden_children() {
        let mut root = forest().roots()[0].clone();
        prune(&mut root, 0);
        assert!(root.children.is_empty());
        assert!(label(&root, false).ends_with("(+2)"));
    }
}
