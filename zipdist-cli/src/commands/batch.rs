use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use zipdist::{DistanceRequest, DistanceResolver, DistanceUnit, LocationStore, ResolveError};

use super::{display_distance, StoreOptions};

const NOT_FOUND: &str = "not_found";

/// Row counts for a processed batch file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub resolved: usize,
    pub not_found: usize,
}

pub async fn run(
    options: &StoreOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    origin_col: String,
    destination_col: String,
    unit: DistanceUnit,
) -> Result<()> {
    let resolver = DistanceResolver::new(options.build().await?);

    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    let summary = process_csv(
        &resolver,
        &input,
        &output_path,
        &origin_col,
        &destination_col,
        unit,
    )
    .await?;

    println!(
        "{} rows, {} resolved, {} not found",
        summary.rows, summary.resolved, summary.not_found
    );
    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    input.with_file_name(format!("{}_distances.csv", stem))
}

/// Append a distance column to every origin/destination row of `input`.
///
/// Each distinct origin is resolved once against all of its destinations.
/// Rows whose origin or destination cannot be resolved get `not_found`.
pub async fn process_csv<S: LocationStore>(
    resolver: &DistanceResolver<S>,
    input: &Path,
    output: &Path,
    origin_col: &str,
    destination_col: &str,
    unit: DistanceUnit,
) -> Result<BatchSummary> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let origin_idx = headers
        .iter()
        .position(|h| h == origin_col)
        .with_context(|| format!("Column '{}' not found in CSV", origin_col))?;
    let destination_idx = headers
        .iter()
        .position(|h| h == destination_col)
        .with_context(|| format!("Column '{}' not found in CSV", destination_col))?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let mut groups: HashMap<String, HashSet<String>> = HashMap::new();
    for record in &records {
        let origin = record.get(origin_idx).unwrap_or("").trim();
        let destination = record.get(destination_idx).unwrap_or("").trim();
        if !origin.is_empty() && !destination.is_empty() {
            groups
                .entry(origin.to_string())
                .or_default()
                .insert(destination.to_string());
        }
    }

    let total: u64 = groups.values().map(|d| d.len() as u64).sum();
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut distances: HashMap<(String, String), f64> = HashMap::new();
    for (origin, destinations) in groups {
        let count = destinations.len() as u64;
        let request =
            DistanceRequest::new(origin.clone(), destinations.into_iter().collect(), unit)?;

        match resolver.resolve(&request).await {
            Ok(response) => {
                for result in response.destinations {
                    distances.insert(
                        (origin.clone(), result.location.postal_code),
                        result.distance,
                    );
                }
            }
            Err(ResolveError::OriginNotFound { .. }) => {
                tracing::warn!(origin = %origin, "Origin postal code not found");
            }
            Err(e) => return Err(e).context("Failed to calculate distances"),
        }

        pb.inc(count);
    }
    pb.finish_with_message("done");

    let output_file = File::create(output).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let distance_col = format!("distance_{}", unit);
    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push(&distance_col);
    writer.write_record(&new_headers)?;

    let mut summary = BatchSummary::default();
    for record in &records {
        let key = (
            record.get(origin_idx).unwrap_or("").trim().to_string(),
            record.get(destination_idx).unwrap_or("").trim().to_string(),
        );
        let value = match distances.get(&key) {
            Some(distance) => {
                summary.resolved += 1;
                display_distance(*distance, unit)
            }
            None => {
                summary.not_found += 1;
                NOT_FOUND.to_string()
            }
        };
        summary.rows += 1;

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&value);
        writer.write_record(&new_record)?;
    }
    writer.flush()?;

    Ok(summary)
}
