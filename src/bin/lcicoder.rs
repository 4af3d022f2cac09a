//! LCI Coder Command Line Interface
//!
//! Decodes and encodes the hex LCI strings used in hostapd's `lci=` setting.
//!
//! Usage:
//!   lcicoder decode 010008001052834d...          # decode
//!   lcicoder encode --lat=-33.857 --lon=151.215  # encode
//!   lcicoder sample                               # worked example
//!
//! Diagnostics go to stderr; `-v` / `-vv` (or `RUST_LOG`) add log output.

#![allow(clippy::doc_markdown)]

use clap::{Args, Parser, Subcommand};
use lcicoder::{
    decode, encode, AltitudeType, BssidList, Datum, Diagnostics, EncodeOptions, FloorField,
    GeodeticField, Inclusion, IndicatorStyle, LocationRecord, Movement, UsagePolicyField,
    ZeroPolicy,
};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sydney Opera House, as published by a hostapd test access point.
const SAMPLE: &str = "010008001052834d12efd2b08b9b4bf1cc2c0000410406000000000012060101";

#[derive(Parser, Debug)]
#[command(
    name = "lcicoder",
    author,
    version,
    about = "IEEE 802.11 LCI encoder/decoder",
    long_about = None
)]
struct Cli {
    /// Log verbosity: -v for debug, -vv for trace (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode an LCI hex string
    Decode {
        /// LCI hex string, e.g. the value of hostapd's lci=
        hex: String,

        /// Print the decoded record and diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Re-encode the decoded record and print it
        #[arg(short, long)]
        check: bool,
    },
    /// Encode an LCI hex string from field values
    Encode(EncodeArgs),
    /// Decode, re-encode and decode again the Sydney Opera House example
    Sample,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Latitude (degrees)
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Longitude (degrees)
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Altitude (unit given by --altitude-type)
    #[arg(long, allow_negative_numbers = true)]
    alt: Option<f64>,
    /// Latitude uncertainty (degrees)
    #[arg(long)]
    lat_unc: Option<f64>,
    /// Longitude uncertainty (degrees)
    #[arg(long)]
    lon_unc: Option<f64>,
    /// Altitude uncertainty
    #[arg(long)]
    alt_unc: Option<f64>,
    /// Altitude type code (1 = meters, 2 = floors, 3 = m above ground)
    #[arg(long)]
    altitude_type: Option<u8>,
    /// Datum code (1 = WGS84, 2 = NAD83+NAVD88, 3 = NAD83+MLLW)
    #[arg(long)]
    datum: Option<u8>,

    /// Floor number
    #[arg(long, allow_negative_numbers = true)]
    floor: Option<f64>,
    /// Height above floor (m)
    #[arg(long, allow_negative_numbers = true)]
    height: Option<f64>,
    /// Height above floor uncertainty (m)
    #[arg(long)]
    height_unc: Option<f64>,
    /// Mark the station as expected to move
    #[arg(long)]
    movable: bool,

    /// Retention expiration in hours
    #[arg(long)]
    expiration: Option<u16>,
    /// Forbid retransmission of the location
    #[arg(long)]
    no_retransmission: bool,

    /// Colocated BSSIDs (comma separated or repeated)
    #[arg(long = "bssid", value_delimiter = ',')]
    bssids: Vec<String>,
    /// Write 0 as the max BSSID indicator instead of the entry count
    #[arg(long)]
    standard_indicator: bool,

    /// Zero uncertainty means smallest (as opposed to unknown)
    #[arg(long)]
    smallest: bool,

    /// Leave out the LCI subelement
    #[arg(long)]
    no_lci: bool,
    /// Leave out the Z subelement
    #[arg(long)]
    no_z: bool,
    /// Leave out the usage rules/policy subelement
    #[arg(long)]
    no_usage: bool,
    /// Leave out the colocated BSSID subelement
    #[arg(long)]
    no_bssids: bool,

    /// Start from a record stored as JSON; field flags override it
    #[arg(long, value_name = "FILE")]
    json_record: Option<PathBuf>,

    /// Print the encoded string and diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Decode the encoded string again and print it
    #[arg(short, long)]
    check: bool,
}

impl EncodeArgs {
    fn has_geodetic(&self) -> bool {
        self.lat.is_some()
            || self.lon.is_some()
            || self.alt.is_some()
            || self.lat_unc.is_some()
            || self.lon_unc.is_some()
            || self.alt_unc.is_some()
            || self.altitude_type.is_some()
            || self.datum.is_some()
    }

    fn has_floor(&self) -> bool {
        self.floor.is_some() || self.height.is_some() || self.height_unc.is_some() || self.movable
    }

    fn options(&self) -> EncodeOptions {
        let inclusion = |skip: bool| if skip { Inclusion::Skip } else { Inclusion::Auto };
        EncodeOptions {
            geodetic: inclusion(self.no_lci),
            floor: inclusion(self.no_z),
            usage: inclusion(self.no_usage),
            bssids: inclusion(self.no_bssids),
            include_unknown: true,
            zero_policy: if self.smallest {
                ZeroPolicy::Smallest
            } else {
                ZeroPolicy::Unknown
            },
            bssid_indicator: if self.standard_indicator {
                IndicatorStyle::Standard
            } else {
                IndicatorStyle::EntryCount
            },
        }
    }
}

/// Install the stderr log subscriber.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Print diagnostics as `kind: context` lines on stderr.
fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags {
        eprintln!("{diag}");
    }
}

/// Print a record in human-readable form.
fn print_record(record: &LocationRecord) {
    if let Some(geo) = &record.geodetic {
        let unit = geo.altitude_type.unit();
        println!("LCI subelement (ID 0)");
        println!(
            "  Latitude:             {:.9} deg (+/- {} deg)",
            geo.latitude, geo.latitude_uncertainty
        );
        println!(
            "  Longitude:            {:.9} deg (+/- {} deg)",
            geo.longitude, geo.longitude_uncertainty
        );
        println!(
            "  Altitude:             {} {unit} (+/- {} {unit})",
            geo.altitude, geo.altitude_uncertainty
        );
        println!("  Altitude type:        {}", geo.altitude_type.code());
        println!("  Datum:                {} ({})", geo.datum.code(), geo.datum.description());
        println!("  RegLoc agreement:     {}", u8::from(geo.regulatory_agreement));
        println!("  RegLoc DSE:           {}", u8::from(geo.dynamic_enablement));
        println!("  Dependent STA:        {}", u8::from(geo.dependent_station));
        println!("  Version:              {}", geo.version);
    }
    if let Some(floor) = &record.floor {
        println!("Z subelement (ID 4)");
        println!("  Floor:                {}", floor.floor);
        println!(
            "  Height above floor:   {} m (+/- {} m)",
            floor.height_above_floor, floor.height_uncertainty
        );
        println!(
            "  Expected to move:     {} ({})",
            floor.movement.code(), floor.movement.description()
        );
    }
    if let Some(usage) = &record.usage {
        println!("Usage rules/policy subelement (ID 6)");
        println!("  Retransmission:       {}", u8::from(usage.retransmission_allowed));
        println!("  Retention expires:    {}", u8::from(usage.retention_expires_present));
        println!("  Location policy:      {}", u8::from(usage.location_policy));
        if usage.retention_expires_present || usage.expiration_hours != 0 {
            println!("  Expiration:           {} hours", usage.expiration_hours);
        }
        if usage.reserved != 0 {
            println!("  Reserved bits:        {:#04x}", usage.reserved << 3);
        }
    }
    if let Some(list) = &record.bssids {
        println!("Colocated BSSID list subelement (ID 7)");
        if let Some(indicator) = list.max_indicator {
            println!("  Max BSSID indicator:  {indicator}");
        }
        for (i, entry) in list.entries.iter().enumerate() {
            println!("  BSSID {:<3}            {entry}", i + 1);
        }
    }
    for raw in &record.unknown {
        println!(
            "Subelement ID {} ({} octets): {}",
            raw.id, raw.payload.len(), hex::encode(&raw.payload)
        );
    }
}

/// Decode an LCI string and report it.
fn do_decode(hex: &str, json: bool, check: bool) -> Result<(), String> {
    let decoded = decode(hex).map_err(|e| format!("Decoding failed: {e}"))?;

    if json {
        let text = serde_json::to_string_pretty(&decoded)
            .map_err(|e| format!("JSON output failed: {e}"))?;
        println!("{text}");
    } else {
        print_record(&decoded.record);
        print_diagnostics(&decoded.diagnostics);
    }

    if check {
        let encoded = encode(&decoded.record, &EncodeOptions::default())
            .map_err(|e| format!("Encoding failed: {e}"))?;
        println!();
        println!("lci={}", encoded.hex);
        print_diagnostics(&encoded.diagnostics);
    }

    Ok(())
}

/// Read the starting record, from JSON or the encoder defaults.
fn base_record(args: &EncodeArgs) -> Result<LocationRecord, String> {
    match &args.json_record {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Invalid record in {}: {e}", path.display()))
        }
        None => Ok(LocationRecord {
            geodetic: Some(GeodeticField::default()),
            floor: Some(FloorField::default()),
            usage: Some(UsagePolicyField::default()),
            ..LocationRecord::default()
        }),
    }
}

/// Build a record from the command line flags.
fn build_record(args: &EncodeArgs) -> Result<LocationRecord, String> {
    let mut record = base_record(args)?;

    if args.has_geodetic() {
        let geo = record.geodetic.get_or_insert_with(GeodeticField::default);
        geo.latitude = args.lat.unwrap_or(geo.latitude);
        geo.longitude = args.lon.unwrap_or(geo.longitude);
        geo.altitude = args.alt.unwrap_or(geo.altitude);
        geo.latitude_uncertainty = args.lat_unc.unwrap_or(geo.latitude_uncertainty);
        geo.longitude_uncertainty = args.lon_unc.unwrap_or(geo.longitude_uncertainty);
        geo.altitude_uncertainty = args.alt_unc.unwrap_or(geo.altitude_uncertainty);
        if let Some(code) = args.altitude_type {
            geo.altitude_type = AltitudeType::from_code(code);
        }
        if let Some(code) = args.datum {
            geo.datum = Datum::from_code(code);
        }
    }

    if args.has_floor() {
        let floor = record.floor.get_or_insert_with(FloorField::default);
        floor.floor = args.floor.unwrap_or(floor.floor);
        floor.height_above_floor = args.height.unwrap_or(floor.height_above_floor);
        floor.height_uncertainty = args.height_unc.unwrap_or(floor.height_uncertainty);
        if args.movable {
            floor.movement = Movement::Variable;
        }
    }

    if args.expiration.is_some() || args.no_retransmission {
        let usage = record.usage.get_or_insert_with(UsagePolicyField::default);
        if let Some(hours) = args.expiration {
            usage.expiration_hours = hours;
        }
        if args.no_retransmission {
            usage.retransmission_allowed = false;
        }
    }

    if !args.bssids.is_empty() {
        record.bssids = Some(BssidList::from_strs(&args.bssids));
    }

    Ok(record)
}

/// Encode an LCI string from the command line.
fn do_encode(args: &EncodeArgs) -> Result<(), String> {
    let record = build_record(args)?;
    let encoded = encode(&record, &args.options()).map_err(|e| format!("Encoding failed: {e}"))?;

    if args.json {
        let text = serde_json::to_string_pretty(&encoded)
            .map_err(|e| format!("JSON output failed: {e}"))?;
        println!("{text}");
    } else {
        println!("lci={}", encoded.hex);
        print_diagnostics(&encoded.diagnostics);
    }

    if args.check {
        println!();
        do_decode(&encoded.hex, false, false)?;
    }

    Ok(())
}

/// Decode the sample, encode it back and decode the result.
fn do_sample() -> Result<(), String> {
    println!("lci={SAMPLE}");
    println!();
    let decoded = decode(SAMPLE).map_err(|e| format!("Decoding failed: {e}"))?;
    print_record(&decoded.record);
    print_diagnostics(&decoded.diagnostics);

    let encoded = encode(&decoded.record, &EncodeOptions::default())
        .map_err(|e| format!("Encoding failed: {e}"))?;
    println!();
    println!("lci={}", encoded.hex);
    print_diagnostics(&encoded.diagnostics);

    let again = decode(&encoded.hex).map_err(|e| format!("Decoding failed: {e}"))?;
    if again.record != decoded.record {
        return Err("Sample did not survive decode/encode/decode".to_string());
    }
    println!(
        "Round trip: {}",
        if encoded.hex == SAMPLE { "byte-identical" } else { "equivalent" }
    );

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Command::Decode { hex, json, check } => do_decode(hex, *json, *check),
        Command::Encode(args) => do_encode(args),
        Command::Sample => do_sample(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
