//! Text rendering of columns.

use std::fmt::Write as _;

use anyhow::Result;
use colored::Colorize;
use schemanav::{Column, SelectionStep, get_options_in_schema_group, has_nested_items};

/// Renders every column as a numbered block, marking the selected entry
/// with `>`. Entries that can be opened further end with `/`.
pub fn render_columns(columns: &[Column]) -> Result<String> {
    let mut out = String::new();
    for (index, column) in columns.iter().enumerate() {
        match column {
            Column::Items { items, selected } => {
                writeln!(out, "{}", format!("[{}] items", index + 1).bold())?;
                for (name, group) in items {
                    let nested = get_options_in_schema_group(group).has_options()
                        || has_nested_items(group, None)?;
                    let label = if nested {
                        format!("{name}/")
                    } else {
                        name.clone()
                    };
                    write_entry(&mut out, selected.as_ref() == Some(name), &label)?;
                }
            }
            Column::Options {
                options, selected, ..
            } => {
                let title = options.group_title.as_deref().unwrap_or("options");
                writeln!(out, "{}", format!("[{}] {title}", index + 1).bold())?;
                for path in options.index_permutations() {
                    let name = options.option_name(&path).unwrap_or_default();
                    let is_selected = selected.as_ref() == Some(&path);
                    let step = SelectionStep::Options(path);
                    write_entry(&mut out, is_selected, &format!("{name} ({step})"))?;
                }
            }
        }
    }
    Ok(out)
}

fn write_entry(out: &mut String, selected: bool, label: &str) -> Result<()> {
    if selected {
        writeln!(out, "  > {}", label.green().bold())?;
    } else {
        writeln!(out, "    {label}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemanav::{Inspector, OptionalsConfig, OptionalsKind, ParseConfig};
    use serde_json::json;

    fn inspector() -> Inspector {
        Inspector::new(
            [(
                "source".to_string(),
                json!({
                    "oneOf": [
                        { "properties": { "path": { "type": "string" } } },
                        { "properties": { "url": { "type": "string" } } }
                    ]
                }),
            )],
            [],
            ParseConfig::default().with_one_of(
                OptionalsConfig::new(OptionalsKind::AsAdditionalColumn).with_group_title("kind"),
            ),
        )
    }

    #[test]
    fn test_render_columns() {
        colored::control::set_override(false);
        let steps = ["source", "@1"]
            .iter()
            .map(|step| step.parse().unwrap())
            .collect::<Vec<SelectionStep>>();
        let columns = inspector().columns(&steps).unwrap();

        let rendered = render_columns(&columns).unwrap();
        assert_eq!(
            rendered,
            "[1] items\n  > source/\n\
             [2] kind\n    Option 1 (@0)\n  > Option 2 (@1)\n\
             [3] items\n    url\n"
        );
    }
}
