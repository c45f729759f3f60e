use clap::Parser;
use doc_path_extraction::{PathChoice, resolve};
use serde_json::Value;

/// Simple runner: resolve a dotted path against a JSON document.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON document (string). You can also pipe a file using shell quoting.
    json: String,
    /// Dotted path, e.g. `a.[].b.c`
    path: String,
    /// Tolerate missing fields instead of failing (optional flag)
    #[arg(long)]
    allow_empty: bool,
    /// Fallback default JSON used when nothing matches (optional)
    #[arg(long)]
    default: Option<String>,
    /// Show only the first match (optional flag)
    #[arg(long)]
    first: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let doc: Value = match serde_json::from_str(&args.json) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON: {e}");
            std::process::exit(1);
        }
    };

    // A default turns the lookup into a one-path fallback chain.
    let out = if let Some(def) = args.default.as_deref() {
        let default_val =
            serde_json::from_str::<Value>(def).unwrap_or_else(|_| Value::String(def.to_string()));
        let choice = PathChoice::path(&args.path).with_default(default_val);
        choice.resolve(&doc, None, None).unwrap_or(Value::Null)
    } else {
        match resolve(&doc, &args.path, args.allow_empty) {
            Ok(nodes) => Value::Array(nodes.into_iter().cloned().collect()),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    };

    let out = if args.first {
        match out {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        }
    } else {
        out
    };

    match serde_json::to_string_pretty(&out) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
