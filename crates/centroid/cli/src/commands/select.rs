//! `select`: evaluate the reference model for one input

use anyhow::Context;
use centroid_selector::{select_raw, Mask, Point};
use clap::Args;
use serde_json::json;

use crate::output::{print_detail, print_json, OutputFormat};

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Eligibility mask, decimal or 0b/0x prefixed (bit 7 = centroid 0)
    #[arg(short, long, value_parser = parse_mask, allow_hyphen_values = true)]
    pub mask: i64,

    /// Centroid as X,Y; repeat eight times
    #[arg(short, long = "centroid", value_parser = parse_point, required = true)]
    pub centroids: Vec<Point>,

    /// Query point as X,Y
    #[arg(short, long, value_parser = parse_point)]
    pub query: Point,

    /// Centroids are listed C1..C8, with C1 on the mask LSB
    #[arg(long)]
    pub testbench_order: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Execute the select command
pub fn execute(args: SelectArgs) -> anyhow::Result<()> {
    let mut centroids = args.centroids;
    if args.testbench_order {
        centroids.reverse();
    }

    let result = select_raw(args.mask, &centroids, args.query)
        .context("cannot evaluate nearest centroid")?;

    match args.output {
        OutputFormat::Text => print_text(&centroids, args.query, result),
        OutputFormat::Json => print_json(&json!({
            "mask": args.mask,
            "query": args.query,
            "centroids": centroids,
            "result": result,
        }))?,
    }
    Ok(())
}

fn print_text(centroids: &[Point], query: Point, result: Mask) {
    println!("Nearest: {} ({})", result, result.bits());
    for index in result.eligible_indices() {
        let centroid = centroids[index];
        print_detail(&format!(
            "centroid {} at {} distance {}",
            index,
            centroid,
            query.manhattan(&centroid)
        ));
    }
}

/// Parse `X,Y` into a point.
pub fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{}`", value))?;
    let coordinate = |raw: &str| {
        raw.trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid coordinate `{}`: {}", raw.trim(), e))
    };
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

/// Parse a mask in decimal, `0b` binary or `0x` hex. Range is checked later.
pub fn parse_mask(value: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    let parsed = if let Some(bin) = trimmed.strip_prefix("0b") {
        i64::from_str_radix(&bin.replace('_', ""), 2)
    } else if let Some(hex) = trimmed.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<i64>()
    };
    parsed.map_err(|e| format!("invalid mask `{}`: {}", value, e))
}
