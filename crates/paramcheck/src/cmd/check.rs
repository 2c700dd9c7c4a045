use std::io::Read;
use std::path::Path;

use paramcheck_core::{ObjectCheckOutcome, ObjectParam};
use paramcheck_json::{CheckReport, SchemaDocument, SchemaRegistry};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::CheckArgs;
use crate::exit::{
    io_error, payload_error, registry_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE,
};
use crate::output::{join_or_dash, print_fields, print_json, OutputFormat};

#[derive(Serialize)]
struct CheckOutput {
    schema_id: &'static str,
    schema: String,
    #[serde(flatten)]
    report: CheckReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<Value>,
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let mut payload = read_payload(&args.payload)?;

    let (schema, outcome) = match (&args.schema, &args.schema_dir, &args.name) {
        (Some(path), _, _) => {
            let param = load_document(path)?;
            (path.display().to_string(), param.check(&mut payload))
        }
        (None, Some(dir), Some(name)) => {
            let registry = SchemaRegistry::from_directory(dir)
                .map_err(|err| registry_error("failed loading schemas", err))?;
            let outcome = registry
                .check(name, &mut payload)
                .map_err(|err| registry_error("check failed", err))?;
            (name.clone(), outcome)
        }
        _ => {
            return Err(CliError::new(
                USAGE,
                "either --schema or --schema-dir with --name is required",
            ))
        }
    };

    log_outcome(&schema, &outcome);

    let report = CheckReport::from_outcome(&outcome);
    let report = if args.show_unsafe {
        report
    } else {
        report.public()
    };
    let successful = report.successful;

    let out = CheckOutput {
        schema_id: "paramcheck/cli/v1/check-report",
        schema,
        report,
        normalized: args.print_normalized.then_some(payload),
    };
    print_check(&out, format);

    if successful {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

fn read_payload(path: &Path) -> CliResult<Value> {
    let raw = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|err| io_error("failed reading payload from stdin", err))?;
        raw
    } else {
        std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading payload {}", path.display()), err))?
    };
    serde_json::from_str(&raw).map_err(|err| payload_error("payload is not valid JSON", err))
}

fn load_document(path: &Path) -> CliResult<ObjectParam<Value>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading schema {}", path.display()), err))?;
    let context = format!("invalid schema {}", path.display());
    SchemaDocument::from_json(&raw)
        .and_then(|document| document.compile())
        .map_err(|err| registry_error(&context, err))
}

fn log_outcome(schema: &str, outcome: &ObjectCheckOutcome) {
    match outcome {
        Ok(checked) => tracing::info!(
            schema,
            provided = checked.provided.len(),
            "payload passed"
        ),
        Err(failure) => tracing::info!(
            schema,
            path = %failure.failing_path(),
            kind = %failure.kind,
            safe = failure.safe_to_show,
            "payload rejected"
        ),
    }
}

fn print_check(out: &CheckOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let report = &out.report;
            let mut rows = vec![
                ("schema", out.schema.clone()),
                ("successful", report.successful.to_string()),
            ];
            if report.successful {
                rows.push(("provided", join_or_dash(&report.provided)));
            } else {
                rows.push(("path", report.failing_parameter_path.clone().unwrap_or_default()));
                rows.push(("kind", report.kind.clone().unwrap_or_default()));
                rows.push(("message", report.message.clone().unwrap_or_default()));
            }
            if let Some(normalized) = &out.normalized {
                rows.push(("normalized", normalized.to_string()));
            }
            print_fields(&rows);
        }
        OutputFormat::Pretty => {
            let report = &out.report;
            if report.successful {
                println!("ok: {} (provided: {})", out.schema, join_or_dash(&report.provided));
            } else {
                println!(
                    "invalid: {} at '{}' ({}): {}",
                    out.schema,
                    report.failing_parameter_path.as_deref().unwrap_or(""),
                    report.kind.as_deref().unwrap_or("unknown"),
                    report.message.as_deref().unwrap_or("")
                );
            }
            if let Some(normalized) = &out.normalized {
                println!(
                    "{}",
                    serde_json::to_string_pretty(normalized).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
    }
}
