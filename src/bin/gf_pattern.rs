//! gf_pattern - compare the CHR-RAM test ROM's logged byte pattern against
//! GF(2^8) generator powers and the naive integer recurrence.

use anyhow::{anyhow, Result};
use clap::Parser;

use frame_probe::gf::{self, PatternComparison};

#[derive(Parser, Debug)]
#[command(
    name = "gf_pattern",
    about = "Compare the logged test-ROM byte pattern with Rijndael field sequences"
)]
struct Args {
    /// Number of bytes to generate
    #[arg(long, default_value_t = 16)]
    count: usize,

    /// Field generator (hex, e.g. 03)
    #[arg(long, default_value = "03", value_name = "HEX")]
    generator: String,

    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_generator(value: &str) -> Result<u8> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(format!("{:0>2}", digits))
        .map_err(|e| anyhow!("generator must be a hex byte: {}", e))?;
    match bytes.as_slice() {
        [b] => Ok(*b),
        _ => Err(anyhow!("generator must be a single byte (got {:?})", value)),
    }
}

fn print_comparison(title: &str, cmp: &PatternComparison) {
    println!("{title}:");
    println!("  expected: {}", gf::hex_row(&cmp.expected));
    println!("  observed: {}", gf::hex_row(&cmp.observed));
    let marks: Vec<&str> = cmp
        .matches
        .iter()
        .map(|&m| if m { "==" } else { "!!" })
        .collect();
    println!("            {}", marks.join(" "));
    match cmp.first_divergence {
        None if cmp.is_exact() => println!("  ✓ all {} bytes match", cmp.matched()),
        None => println!(
            "  ⚠ {} shared bytes match, lengths differ ({} vs {})",
            cmp.matched(),
            cmp.expected.len(),
            cmp.observed.len()
        ),
        Some(index) => println!(
            "  ⚠ {}/{} bytes match, first divergence at index {}",
            cmp.matched(),
            cmp.matches.len(),
            index
        ),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let generator = parse_generator(&args.generator)?;
    if generator == 0 {
        return Err(anyhow!("generator 00 has no powers"));
    }
    log::debug!("generator {:02X}, {} bytes", generator, args.count);

    let powers = gf::compare(&gf::powers(generator, args.count), &gf::LOGGED_PATTERN);
    let naive = gf::compare(&gf::naive_pattern(args.count), &gf::LOGGED_PATTERN);

    if args.json {
        let report = serde_json::json!({
            "generator": generator,
            "field_powers": powers,
            "naive_recurrence": naive,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Logged pattern (first {} bytes):", gf::LOGGED_PATTERN.len());
    println!("  {}", gf::hex_row(&gf::LOGGED_PATTERN));
    println!();
    print_comparison(&format!("Powers of {:02X} in GF(2^8) mod 11B", generator), &powers);
    println!();
    print_comparison("Seed bytes then x3 mod 256", &naive);
    Ok(())
}
