use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::{Platform, Project};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn platform_cell(platform: &Platform) -> Cell {
    let cell = Cell::new(platform.as_str());
    match platform {
        Platform::GitHub | Platform::GitLab => cell.fg(TableColor::Magenta),
        Platform::Unsupported(_) => cell.fg(TableColor::Red),
    }
}

/// Table of tracked projects in registry order.
pub fn projects_table(projects: &[Project]) -> Table {
    let mut table = create_table();
    table.set_header(
        ["#", "Project", "Platform", "Remote", "Added"]
            .into_iter()
            .map(|label| Cell::new(label).fg(TableColor::Cyan)),
    );

    for (i, project) in projects.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&project.name),
            platform_cell(&project.platform),
            Cell::new(&project.remote_url),
            Cell::new(project.added_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table
}
