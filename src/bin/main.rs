//! Prism CLI - compile and run cube requests
//!
//! Usage:
//!   prism compile --cube <name> [-m measure]... [-d drilldown]... [-c cut]...
//!   prism aggregate --cube <name> [...] [--format csv|jsonrecords|json]
//!   prism cubes
//!   prism members --cube <name> --dimension <dim> --level <level>
//!
//! Every command reads the engine from `--catalog <file.json>` when given,
//! else from the configured settings (prism.toml).
//!
//! Examples:
//!   prism compile --catalog foodmart.json --cube Sales -d Time.Year -c Product.Product Family.Drink
//!   prism aggregate --cube Sales -d Time.Year --format csv

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use prism::config::Settings;
use prism::describe::{describe_cube, level_members, MemberOptions};
use prism::format::Format;
use prism::{aggregate, compile_request, AggregateRequest, CatalogEngine, Session};

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Prism - compile cube requests to MDX and flatten the results")]
#[command(version)]
struct Cli {
    /// JSON catalog to serve cubes from instead of the configured engine
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the MDX a request compiles to
    Compile(RequestArgs),

    /// Compile, execute and print the result
    Aggregate {
        #[command(flatten)]
        request: RequestArgs,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// List the cubes the engine serves
    Cubes {
        /// Print each cube's full description as JSON
        #[arg(long)]
        describe: bool,
    },

    /// List the members of a level as JSON
    Members {
        #[arg(long)]
        cube: String,

        #[arg(long)]
        dimension: String,

        #[arg(long)]
        level: String,

        /// Include member children
        #[arg(long)]
        children: bool,
    },
}

#[derive(Args)]
struct RequestArgs {
    #[arg(long)]
    cube: String,

    #[arg(short, long = "measure")]
    measures: Vec<String>,

    #[arg(short, long)]
    drilldown: Vec<String>,

    #[arg(short, long)]
    cut: Vec<String>,

    #[arg(short, long)]
    filter: Vec<String>,

    #[arg(long)]
    order: Option<String>,

    /// Sort descending
    #[arg(long, requires = "order")]
    desc: bool,

    #[arg(long)]
    offset: Option<u64>,

    #[arg(long)]
    limit: Option<u64>,

    #[arg(long)]
    nonempty: bool,

    #[arg(long)]
    distinct: bool,

    /// `Dimension.Level.Property` columns to add
    #[arg(long = "property")]
    properties: Vec<String>,

    /// Properties that replace member captions
    #[arg(long)]
    caption: Vec<String>,

    #[arg(long)]
    parents: bool,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    sparse: bool,
}

impl RequestArgs {
    fn into_request(self, settings: &Settings) -> (String, AggregateRequest) {
        let defaults = settings.query;
        let request = AggregateRequest {
            measures: self.measures,
            drilldown: self.drilldown,
            cut: self.cut,
            filter: self.filter,
            order: self.order,
            order_desc: self.desc,
            offset: self.offset,
            limit: self.limit,
            nonempty: self.nonempty || defaults.nonempty,
            distinct: self.distinct || defaults.distinct,
            properties: self.properties,
            caption: self.caption,
            parents: self.parents || defaults.parents,
            debug: self.debug || defaults.debug,
            sparse: self.sparse || defaults.sparse,
        };
        (self.cube, request)
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Header row plus one line per tidy row
    Csv,
    /// {"data": [{column: value}]}
    Jsonrecords,
    /// Axes, axis dimensions and nested values
    Json,
}

impl From<OutputFormat> for Format {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Csv => Format::Csv,
            OutputFormat::Jsonrecords => Format::JsonRecords,
            OutputFormat::Json => Format::Json,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = match open_session(cli.catalog.as_ref(), &settings).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Engine error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Compile(args) => cmd_compile(&session, &settings, args).await,
        Commands::Aggregate { request, format } => {
            cmd_aggregate(&session, &settings, request, format.into()).await
        }
        Commands::Cubes { describe } => cmd_cubes(&session, describe).await,
        Commands::Members {
            cube,
            dimension,
            level,
            children,
        } => cmd_members(&session, &cube, &dimension, &level, children).await,
    }
}

async fn open_session(
    catalog: Option<&PathBuf>,
    settings: &Settings,
) -> prism::QueryResult<Session> {
    match catalog {
        Some(path) => {
            let engine = CatalogEngine::from_file(path)?;
            Ok(Session::new(Arc::new(engine)))
        }
        None => Session::connect(settings).await,
    }
}

async fn cmd_compile(session: &Session, settings: &Settings, args: RequestArgs) -> ExitCode {
    let (cube, request) = args.into_request(settings);
    match compile_request(session, &cube, &request).await {
        Ok(query) => {
            println!("{}", query.to_mdx());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_aggregate(
    session: &Session,
    settings: &Settings,
    args: RequestArgs,
    format: Format,
) -> ExitCode {
    let (cube, request) = args.into_request(settings);
    let aggregation = match aggregate(session, &cube, &request).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Query error ({}): {}", e.status(), e);
            return ExitCode::FAILURE;
        }
    };

    match aggregation.render(format) {
        Ok(output) => {
            print!("{}", output);
            if format != Format::Csv {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Output error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_cubes(session: &Session, describe: bool) -> ExitCode {
    let names = match session.cube_names().await {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Engine error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !describe {
        for name in names {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    let mut descriptions = Vec::with_capacity(names.len());
    for name in &names {
        match session.cube(name).await {
            Ok(cube) => descriptions.push(describe_cube(&cube)),
            Err(e) => {
                eprintln!("Engine error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    print_json(&descriptions)
}

async fn cmd_members(
    session: &Session,
    cube: &str,
    dimension: &str,
    level: &str,
    children: bool,
) -> ExitCode {
    let cube = match session.cube(cube).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Query error ({}): {}", e.status(), e);
            return ExitCode::FAILURE;
        }
    };

    let options = MemberOptions {
        children,
        ..MemberOptions::default()
    };
    match level_members(session, &cube, dimension, level, &options).await {
        Ok(members) => print_json(&members),
        Err(e) => {
            eprintln!("Query error ({}): {}", e.status(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Output error: {}", e);
            ExitCode::FAILURE
        }
    }
}
