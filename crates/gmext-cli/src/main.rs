use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::Rng;

use gmext::{
    read_ged, read_gex, write_ged, write_gex, Compression, Package, PayloadSink, PayloadSource,
};

#[derive(Parser)]
#[command(name = "gmext", about = "Pack and unpack GameMaker 8 extension containers")]
struct Cli {
    /// Input file: .ged/.gmp is packed into a .gex, .gex is unpacked into a folder.
    input: PathBuf,
    /// Output path: the .gex to write, or the folder to unpack into.
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let extension = cli
        .input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "ged" | "gmp" => pack(&cli.input, cli.output.as_deref()),
        "gex" => unpack(&cli.input, cli.output.as_deref()),
        other => bail!("unrecognized input extension '{other}' (expected .ged, .gmp, or .gex)"),
    }
}

/// Compile an editable project into a package, pulling payload bytes from
/// the files its data entries point at.
fn pack(input: &Path, output: Option<&Path>) -> Result<()> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let mut prototype = read_ged(&mut BufReader::new(file))
        .with_context(|| format!("failed to read {}", input.display()))?;

    if prototype.temp_folder.is_empty() {
        prototype.temp_folder = random_temp_folder();
        eprintln!("[pack] no temp folder configured, using {}", prototype.temp_folder);
    }

    let base = input.parent().unwrap_or(Path::new(".")).to_path_buf();
    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("gex"));

    let mut package = Package::new(random_seed(), prototype);
    let out = File::create(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    write_gex(
        BufWriter::new(out),
        &mut package,
        |name, source| {
            let path = resolve_source(&base, source, name);
            match File::open(&path) {
                Ok(payload) => {
                    eprintln!("[pack] + {name} <- {}", path.display());
                    Ok(PayloadSource::Reader(Box::new(payload)))
                }
                Err(err) => {
                    eprintln!("[pack] ! missing payload '{name}' ({err}), writing empty block");
                    Ok(PayloadSource::Skip)
                }
            }
        },
        true,
        Compression::best(),
    )
    .with_context(|| format!("failed to write {}", out_path.display()))?;

    eprintln!("[pack] wrote {}", out_path.display());
    Ok(())
}

/// Unpack a package: payload files land in the output folder and an
/// editable project pointing at them is emitted alongside.
fn unpack(input: &Path, output: Option<&Path>) -> Result<()> {
    let out_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(""));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let package = read_gex(BufReader::new(file), |name, source| {
        let path = out_dir.join(sanitize_file_name(name));
        let sink = File::create(&path)?;
        *source = path.display().to_string();
        eprintln!("[unpack] + {}", path.display());
        Ok(PayloadSink::Writer(Box::new(sink)))
    })
    .with_context(|| format!("failed to read {}", input.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("extension");
    let ged_path = out_dir.join(format!("{stem}.ged"));
    let ged = File::create(&ged_path)
        .with_context(|| format!("failed to create {}", ged_path.display()))?;
    write_ged(&mut BufWriter::new(ged), &package.prototype, false)?;

    eprintln!("[unpack] wrote {}", ged_path.display());
    Ok(())
}

/// Where a data entry's payload bytes live on disk: the source hint when it
/// still resolves, otherwise the logical name next to the project file.
fn resolve_source(base: &Path, source: &str, name: &str) -> PathBuf {
    if !source.is_empty() {
        let hinted = PathBuf::from(source.replace('\\', "/"));
        if hinted.is_file() {
            return hinted;
        }
    }
    base.join(sanitize_file_name(name))
}

/// Payload names come from inside the container; keep only the final path
/// component so a hostile hint cannot escape the output folder.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['\\', '/']).next().unwrap_or(name);
    match base {
        "" | "." | ".." => "payload.bin".to_string(),
        other => other.to_string(),
    }
}

fn random_seed() -> i32 {
    rand::thread_rng().gen_range(0..250_000)
}

/// Random 3-digit temp folder name, e.g. `temp042`.
fn random_temp_folder() -> String {
    format!("temp{:03}", rand::thread_rng().gen_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_paths() {
        assert_eq!(sanitize_file_name("..\\..\\evil.dll"), "evil.dll");
        assert_eq!(sanitize_file_name("a/b/c.bin"), "c.bin");
        assert_eq!(sanitize_file_name(".."), "payload.bin");
        assert_eq!(sanitize_file_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn temp_folder_shape() {
        let name = random_temp_folder();
        assert_eq!(name.len(), 7);
        assert!(name.starts_with("temp"));
        assert!(name[4..].chars().all(|c| c.is_ascii_digit()));
    }
}
