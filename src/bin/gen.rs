//! ipgeo-gen: CLI tool for building and inspecting geolocation artifacts.

use clap::{Parser, Subcommand};
use ipgeo::vendor::{DEFAULT_DOWNLOAD_URL, TOKEN_ENV_VAR};
use ipgeo::{
    AddressFamily, ArtifactMetadata, Compiler, Error, GeoTables, Locator, VendorClient, VendorConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ipgeo-gen")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Build and query IP geolocation artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the vendor dataset and compile it
    Download {
        /// Output artifact file
        #[arg(short, long, default_value = "DatabaseGeolocate.kani.gz")]
        output: PathBuf,

        /// Also fetch and compile the IPv6 dataset
        #[arg(long)]
        ipv6: bool,

        /// Vendor download token
        #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
        token: Option<String>,

        /// Vendor download endpoint
        #[arg(long, default_value = DEFAULT_DOWNLOAD_URL)]
        base_url: String,

        /// Skip the download if the existing artifact is younger than this
        #[arg(long)]
        max_age_hours: Option<u64>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compile local vendor CSV files
    Convert {
        /// IPv4 CSV file
        #[arg(long)]
        ipv4: PathBuf,

        /// IPv6 CSV file
        #[arg(long)]
        ipv6: Option<PathBuf>,

        /// Output artifact file
        #[arg(short, long, default_value = "DatabaseGeolocate.kani.gz")]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Look up addresses in an artifact
    Lookup {
        /// Artifact file
        #[arg(short, long, default_value = "DatabaseGeolocate.kani.gz")]
        artifact: PathBuf,

        /// Force a table (v4 or v6) instead of detecting it per address
        #[arg(long, value_parser = parse_family)]
        family: Option<AddressFamily>,

        /// Print one JSON object per address
        #[arg(long)]
        json: bool,

        /// Addresses to resolve
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Check an artifact against its sidecar and load it
    Verify {
        /// Artifact file
        #[arg(default_value = "DatabaseGeolocate.kani.gz")]
        artifact: PathBuf,
    },
}

fn parse_family(s: &str) -> Result<AddressFamily, String> {
    AddressFamily::parse(s).ok_or_else(|| format!("unknown address family {:?}", s))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Download {
            output,
            ipv6,
            token,
            base_url,
            max_age_hours,
            verbose,
        } => download_and_compile(
            &output,
            ipv6,
            token.as_deref(),
            &base_url,
            max_age_hours,
            verbose,
        ),
        Commands::Convert {
            ipv4,
            ipv6,
            output,
            verbose,
        } => convert_files(&ipv4, ipv6.as_deref(), &output, verbose),
        Commands::Lookup {
            artifact,
            family,
            json,
            addresses,
        } => lookup_addresses(&artifact, family, json, &addresses),
        Commands::Verify { artifact } => verify_artifact(&artifact),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn download_and_compile(
    output: &Path,
    ipv6: bool,
    token: Option<&str>,
    base_url: &str,
    max_age_hours: Option<u64>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(hours) = max_age_hours {
        if is_fresh(output, Duration::from_secs(hours * 3600))? {
            println!("{:?} is younger than {} hours, skipping download", output, hours);
            return Ok(());
        }
    }

    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or(Error::MissingToken(TOKEN_ENV_VAR))?;
    let mut config = VendorConfig::with_token(token.trim()).with_base_url(base_url);
    if ipv6 {
        config = config.include_ipv6();
    }

    let client = VendorClient::new(config)?;
    let mut compiler = Compiler::new();

    for product in &client.config().products {
        if verbose {
            println!("Downloading {} ({})", product.code, product.family);
        }
        let csv = client.fetch_csv(product)?;
        let rows = compiler.add_csv(product.family, &csv[..])?;
        if verbose {
            println!("  {} rows from {}", rows, product.member);
        }
    }

    let meta = compiler.write_file(output)?;
    print_summary(output, &meta);
    Ok(())
}

/// Whether `output` exists, matches its sidecar and was built within `max_age`.
fn is_fresh(output: &Path, max_age: Duration) -> Result<bool, Box<dyn std::error::Error>> {
    if !output.exists() {
        return Ok(false);
    }
    let meta = ArtifactMetadata::load_for(output)?;
    if meta.needs_update(max_age) {
        return Ok(false);
    }
    if !meta.matches(&fs::read(output)?) {
        log::warn!("{:?} does not match its sidecar checksum, rebuilding", output);
        return Ok(false);
    }
    Ok(true)
}

fn convert_files(
    ipv4: &Path,
    ipv6: Option<&Path>,
    output: &Path,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut compiler = Compiler::new();

    if verbose {
        println!("Reading IPv4 input: {:?}", ipv4);
    }
    compiler.add_csv_file(AddressFamily::V4, ipv4)?;

    if let Some(path) = ipv6 {
        if verbose {
            println!("Reading IPv6 input: {:?}", path);
        }
        compiler.add_csv_file(AddressFamily::V6, path)?;
    }

    let meta = compiler.write_file(output)?;
    print_summary(output, &meta);
    Ok(())
}

fn print_summary(output: &Path, meta: &ArtifactMetadata) {
    println!(
        "Generated {:?}: {} IPv4 ranges, {} IPv6 ranges, {} strings",
        output, meta.ipv4_ranges, meta.ipv6_ranges, meta.strings
    );
}

fn lookup_addresses(
    artifact: &Path,
    family: Option<AddressFamily>,
    json: bool,
    addresses: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let locator = Locator::open(artifact)?;

    for address in addresses {
        let location = match family {
            None => locator.locate(address),
            Some(AddressFamily::V4) => locator.locate_v4(address),
            Some(AddressFamily::V6) => locator.locate_v6(address),
        };

        match (location, json) {
            (Some(location), true) => {
                println!(
                    "{}",
                    serde_json::json!({ "address": address, "location": location })
                );
            }
            (None, true) => {
                println!("{}", serde_json::json!({ "address": address, "location": null }));
            }
            (Some(location), false) => {
                println!("{}\t{}\tUTC{}", address, location, location.utc_offset());
            }
            (None, false) => println!("{}\tunknown location", address),
        }
    }

    Ok(())
}

fn verify_artifact(artifact: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(artifact)?;
    let meta = ArtifactMetadata::load_for(artifact)?;

    match meta.sha256 {
        None => log::warn!("No sidecar for {:?}, skipping checksum", artifact),
        Some(_) if !meta.matches(&data) => {
            return Err(format!("{:?} does not match its sidecar checksum", artifact).into());
        }
        Some(_) => log::info!("Checksum OK"),
    }

    let tables = GeoTables::from_gz_bytes(&data)?;
    let header = tables.header();

    if meta.sha256.is_some()
        && (header.v4_count, header.v6_count, header.string_count)
            != (meta.ipv4_ranges, meta.ipv6_ranges, meta.strings)
    {
        return Err(format!("{:?} counts disagree with its sidecar", artifact).into());
    }

    println!(
        "{:?} OK: {} IPv4 ranges, {} IPv6 ranges, {} strings",
        artifact, header.v4_count, header.v6_count, header.string_count
    );
    Ok(())
}
