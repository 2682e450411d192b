//! A small demonstration CLI over `jclass`/`jdep`/`jmanifest`/`jarchive`/
//! `jdiff`: `show` prints structural info about a class file, JAR, or
//! distribution directory; `diff` compares two such inputs and prints
//! the resulting delta tree as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jarchive::{DistWalker, JarReader};
use jclass::ClassFile;
use jdiff::ignore::IgnorePolicy;
use jdiff::{apply_ignore_policy, diff_class, diff_distribution, diff_jar};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print structural information about a class file, JAR, or distribution directory.
    Show {
        path: PathBuf,
    },
    /// Compare two class files, JARs, or distribution directories and print the delta tree as JSON.
    Diff {
        left: PathBuf,
        right: PathBuf,

        /// Ignore token to suppress (may be repeated); see jdiff::ignore for the known vocabulary.
        #[arg(long = "ignore")]
        ignores: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Class,
    Jar,
    Dist,
}

fn classify(path: &Path) -> Kind {
    if path.is_dir() {
        return Kind::Dist;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("jar") | Some("war") | Some("ear") => Kind::Jar,
        _ => Kind::Class,
    }
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Show { path } => show(&path),
        Command::Diff { left, right, ignores } => diff(&left, &right, ignores),
    }
}

fn show(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match classify(path) {
        Kind::Class => {
            let bytes = fs::read(path)?;
            let outcome = ClassFile::parse_lenient(&bytes)?;
            print_class(&outcome.class);
            for warning in &outcome.warnings {
                println!("warning: {warning:?}");
            }
        }
        Kind::Jar => {
            let bytes = fs::read(path)?;
            let mut reader = JarReader::open(bytes)?;
            if let Some(manifest) = reader.read_manifest()? {
                println!("manifest main section: {} headers", manifest.main.headers.len());
            }
            for name in reader.class_entry_names() {
                println!("class: {name}");
            }
        }
        Kind::Dist => {
            let entries = DistWalker::new(path).walk()?;
            for entry in entries {
                println!("{:?}\t{}", entry.kind, entry.relative_path);
            }
        }
    }
    Ok(())
}

fn print_class(class: &ClassFile) {
    println!("class {}", class.this_class_name().unwrap_or("?"));
    if let Ok(Some(super_name)) = class.super_class_name() {
        println!("  extends {super_name}");
    }
    for interface in class.interface_names().unwrap_or_default() {
        println!("  implements {interface}");
    }
    for field in &class.fields {
        let name = field.name(&class.constant_pool).unwrap_or("?");
        let descriptor = field.descriptor(&class.constant_pool).unwrap_or("?");
        println!("  field {name}: {descriptor}");
    }
    for method in &class.methods {
        let name = method.name(&class.constant_pool).unwrap_or("?");
        let descriptor = method.descriptor(&class.constant_pool).unwrap_or("?");
        println!("  method {name}{descriptor}");
    }
    if let Ok(symbols) = jdep::extract(class) {
        println!("  provides: {:?}", symbols.provides);
        println!("  requires: {:?}", symbols.requires);
    }
}

fn diff(left: &Path, right: &Path, ignores: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let policy = IgnorePolicy::from_tokens(ignores);
    let left_kind = classify(left);
    let right_kind = classify(right);
    if left_kind != right_kind {
        return Err(format!("cannot diff a {left_kind:?} against a {right_kind:?}").into());
    }

    let delta = match left_kind {
        Kind::Class => {
            let left_class = ClassFile::parse_lenient(&fs::read(left)?)?.class;
            let right_class = ClassFile::parse_lenient(&fs::read(right)?)?.class;
            diff_class(Some(&left_class), Some(&right_class))
        }
        Kind::Jar => {
            let mut left_reader = JarReader::open(fs::read(left)?)?;
            let mut right_reader = JarReader::open(fs::read(right)?)?;
            diff_jar(&mut left_reader, &mut right_reader)?
        }
        Kind::Dist => diff_distribution(left, right)?,
    };

    let collapsed = apply_ignore_policy(delta, &policy);
    println!("{}", collapsed.to_json()?);
    Ok(())
}
