//! Command implementations

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::app::{AppContainer, DefaultAppContainer, ReportRequest};
use crate::cli::args::{ProbeArgs, SectionsArgs};
use crate::config_initialization::EffectiveConfig;
use crate::output::section::catalog_tree;
use crate::output::{OverwritePolicy, ReportSink, SectionId, SECTIONS};

/// Execute the probe command
pub async fn probe(args: ProbeArgs, config: &EffectiveConfig) -> Result<()> {
    info!("Starting probe operation");
    info!("Input: {}", args.input);

    let overwrite = if args.overwrite {
        OverwritePolicy::Always
    } else {
        OverwritePolicy::Never
    };
    let request = ReportRequest {
        input_path: args.input.clone(),
        sink: ReportSink::from_path(args.output.as_deref(), overwrite),
        print_format: config.print_format,
        compact: config.compact,
        show_data: args.show_data,
        writer: config
            .writer_options()
            .context("Invalid report settings")?,
    };

    let container = DefaultAppContainer::new(args.source)
        .with_context(|| format!("Cannot use the {} media source", args.source))?;
    let response = container
        .report_interactor()
        .execute(request)
        .await
        .with_context(|| format!("Failed to report on {}", args.input))?;

    info!(
        "Probe operation completed: {} streams, {} side-data records, written to {}",
        response.streams, response.side_data, response.destination
    );
    Ok(())
}

/// Execute the sections command
pub fn sections(args: SectionsArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.json {
        let catalog: Vec<_> = SECTIONS
            .iter()
            .map(|section| {
                json!({
                    "name": section.name,
                    "unique_name": section.unique_name,
                    "element_name": section.element_name,
                    "wrapper": section.is_wrapper(),
                    "array": section.is_array(),
                    "variable_fields": section.has_variable_fields(),
                    "children": section
                        .children
                        .iter()
                        .map(|child| child.section().qualified_name())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &catalog).context("Failed to print sections")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Sections:")?;
    writeln!(out, "W.. = Section is a wrapper (contains other sections, no local entries)")?;
    writeln!(out, ".A. = Section contains an array of elements of the same type")?;
    writeln!(out, "..V = Section may contain a variable number of fields with variable keys")?;
    writeln!(out, "FLAGS NAME/UNIQUE_NAME")?;
    writeln!(out, "---")?;
    for line in catalog_tree(SectionId::Root) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
