//! Command-line interface for wfs20
//!
//! Builds WFS 2.0 requests from arguments and prints them as XML or JSON.

#[cfg(feature = "cli")]
use clap::{ArgAction, Args, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use wfs20::datatypes::ResultType;
#[cfg(feature = "cli")]
use wfs20::fes::{Filter, SortBy};
#[cfg(feature = "cli")]
use wfs20::namespaces::{Ns, QName};
#[cfg(feature = "cli")]
use wfs20::ows::AcceptVersions;
#[cfg(feature = "cli")]
use wfs20::wfs::{
    Delete, DescribeFeatureType, GetCapabilities, GetFeature, PropertyName, Query, StoredQuery,
    Transaction, WfsDocument,
};
#[cfg(feature = "cli")]
use wfs20::{Encoder, RootElement, Validate};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "wfs20")]
#[command(author, version, about = "Build OGC WFS 2.0 request documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the record as JSON instead of XML
    #[arg(long, global = true)]
    json: bool,

    /// Bind a namespace prefix on the root element (prefix=uri)
    #[arg(
        short = 'n',
        long = "namespace",
        value_name = "PREFIX=URI",
        value_parser = parse_binding,
        global = true
    )]
    namespaces: Vec<(String, String)>,

    /// Output file (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a GetCapabilities request
    #[command(name = "get-capabilities")]
    GetCapabilities {
        /// Accepted protocol versions
        #[arg(long = "accept-version", value_name = "VERSION")]
        accept_versions: Vec<String>,
    },

    /// Build a DescribeFeatureType request
    #[command(name = "describe-feature-type")]
    DescribeFeatureType {
        /// Feature type names (prefix:name); none describes every type
        #[arg(value_name = "TYPE_NAME")]
        type_names: Vec<String>,

        /// Requested schema format
        #[arg(long)]
        output_format: Option<String>,
    },

    /// Build a GetFeature request
    #[command(name = "get-feature")]
    GetFeature(GetFeatureArgs),

    /// Build a Transaction with a single Delete action
    Delete {
        /// Feature type name (prefix:name)
        #[arg(short = 't', long = "type-name")]
        type_name: String,

        /// File holding the fes:Filter element
        #[arg(short, long, value_name = "FILE")]
        filter: PathBuf,

        /// Handle for the transaction
        #[arg(long)]
        handle: Option<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(Args, Debug)]
struct GetFeatureArgs {
    /// Feature type names for an ad hoc query
    #[arg(
        short = 't',
        long = "type-name",
        value_name = "TYPE_NAME",
        required_unless_present = "stored_query"
    )]
    type_names: Vec<String>,

    /// Stored query identifier instead of an ad hoc query
    #[arg(long, value_name = "ID", conflicts_with = "type_names")]
    stored_query: Option<String>,

    /// Stored query parameter (name=value)
    #[arg(
        short = 'p',
        long = "param",
        value_name = "NAME=VALUE",
        value_parser = parse_binding,
        requires = "stored_query"
    )]
    params: Vec<(String, String)>,

    /// Properties to return
    #[arg(long = "property", value_name = "NAME")]
    properties: Vec<String>,

    /// File holding the fes:Filter element
    #[arg(short, long, value_name = "FILE")]
    filter: Option<PathBuf>,

    /// Sort order, e.g. "NAME ASC,POP DESC"
    #[arg(long)]
    sort_by: Option<String>,

    /// Maximum number of features
    #[arg(long)]
    count: Option<u64>,

    /// Index of the first feature
    #[arg(long)]
    start_index: Option<u64>,

    /// Ask for the number of matches only
    #[arg(long)]
    hits: bool,

    /// Response format
    #[arg(long)]
    output_format: Option<String>,

    /// Handle for the request
    #[arg(long)]
    handle: Option<String>,
}

#[cfg(feature = "cli")]
fn parse_binding(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, found '{}'", text)),
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root: RootElement = match cli.command {
        Commands::GetCapabilities { accept_versions } => {
            let mut request = GetCapabilities::new();
            if !accept_versions.is_empty() {
                request.accept_versions.set(AcceptVersions::new(accept_versions));
            }
            request.into()
        }
        Commands::DescribeFeatureType {
            type_names,
            output_format,
        } => {
            let mut request = DescribeFeatureType::new();
            request.type_names = type_names_from(&type_names, &cli.namespaces)?;
            if let Some(format) = output_format {
                request.output_format.set(format);
            }
            request.into()
        }
        Commands::GetFeature(args) => build_get_feature(args, &cli.namespaces)?.into(),
        Commands::Delete {
            type_name,
            filter,
            handle,
        } => {
            let type_name = type_names_from(&[type_name], &cli.namespaces)?.remove(0);
            let filter = Filter::from_xml(&fs::read_to_string(&filter)?)?;
            let mut transaction = Transaction::new();
            transaction.base.handle = handle;
            transaction.add(Delete::new(type_name, filter));
            transaction.into()
        }
    };

    root.validate()?;
    tracing::info!(root = %root.element_name(), "request built");

    let mut document = WfsDocument::new(root).with_wfs_schema_location();
    for (prefix, uri) in &cli.namespaces {
        document = document.with_prefix(prefix, uri)?;
    }

    let text = if cli.json {
        serde_json::to_string_pretty(&document)? + "\n"
    } else {
        Encoder::new().encode_document(&document)?
    };

    match cli.output {
        Some(path) => {
            fs::write(&path, text)?;
            tracing::info!(path = %path.display(), "written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn build_get_feature(
    args: GetFeatureArgs,
    namespaces: &[(String, String)],
) -> Result<GetFeature, Box<dyn std::error::Error>> {
    let mut request = GetFeature::new();
    request.base.handle = args.handle;
    request.presentation.count = args.count;
    if let Some(start) = args.start_index {
        request.presentation.start_index.set(start);
    }
    if args.hits {
        request.presentation.result_type.set(ResultType::Hits);
    }
    if let Some(format) = args.output_format {
        request.presentation.output_format.set(format);
    }

    match args.stored_query {
        Some(id) => {
            let mut stored = StoredQuery::new(id);
            for (name, value) in args.params {
                stored = stored.with_parameter(name, value);
            }
            request.add_query(stored);
        }
        None => {
            let mut type_names = type_names_from(&args.type_names, namespaces)?.into_iter();
            let first = type_names.next().ok_or("get-feature needs --type-name or --stored-query")?;
            let mut query = Query::new(first);
            query.type_names.extend(type_names);
            for property in &args.properties {
                query
                    .property_names
                    .push(PropertyName::new(QName::parse_lexical(property)?));
            }
            if let Some(path) = &args.filter {
                query.filter.set(Filter::from_xml(&fs::read_to_string(path)?)?);
            }
            if let Some(sort_by) = &args.sort_by {
                query.sort_by.set(SortBy::parse_kvp(sort_by)?);
            }
            request.add_query(query);
        }
    }
    Ok(request)
}

/// Parse type names, requiring every prefix to be bound
#[cfg(feature = "cli")]
fn type_names_from(
    names: &[String],
    namespaces: &[(String, String)],
) -> Result<Vec<QName>, Box<dyn std::error::Error>> {
    let mut qnames = Vec::with_capacity(names.len());
    for name in names {
        let qname = QName::parse_lexical(name)?;
        if let Some(prefix) = qname.prefix.as_deref() {
            let declared = Ns::DECLARED.iter().any(|ns| ns.prefix() == Some(prefix))
                || namespaces.iter().any(|(p, _)| p == prefix);
            if !declared {
                return Err(format!(
                    "prefix '{}' is not bound; use --namespace {}=URI",
                    prefix, prefix
                )
                .into());
            }
        }
        qnames.push(qname);
    }
    Ok(qnames)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
