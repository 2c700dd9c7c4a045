use paramcheck_json::SchemaRegistry;
use serde::Serialize;

use crate::cmd::SchemasArgs;
use crate::exit::{registry_error, CliResult, SUCCESS};
use crate::output::{join_or_dash, print_json, print_rows, OutputFormat};

#[derive(Debug, Serialize)]
struct SchemaInfo {
    name: String,
    required: Vec<String>,
    optional: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SchemasOutput {
    schema_id: &'static str,
    directory: String,
    schemas: Vec<SchemaInfo>,
}

pub fn run(args: SchemasArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = SchemaRegistry::from_directory(&args.dir)
        .map_err(|err| registry_error("failed loading schemas", err))?;

    let schemas = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            registry.get(name).map(|param| SchemaInfo {
                name: name.to_string(),
                required: param.required_names().into_iter().map(str::to_string).collect(),
                optional: param.optional_names().into_iter().map(str::to_string).collect(),
            })
        })
        .collect();

    let out = SchemasOutput {
        schema_id: "paramcheck/cli/v1/schema-list",
        directory: args.dir.display().to_string(),
        schemas,
    };
    print_schemas(&out, format);
    Ok(SUCCESS)
}

fn print_schemas(out: &SchemasOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let rows = out
                .schemas
                .iter()
                .map(|s| {
                    vec![
                        s.name.clone(),
                        join_or_dash(&s.required),
                        join_or_dash(&s.optional),
                    ]
                })
                .collect();
            print_rows(&["NAME", "REQUIRED", "OPTIONAL"], rows);
        }
        OutputFormat::Pretty => {
            println!("Schemas in {}:", out.directory);
            for s in &out.schemas {
                println!("  {}", s.name);
                println!("    required: {}", join_or_dash(&s.required));
                println!("    optional: {}", join_or_dash(&s.optional));
            }
        }
    }
}
