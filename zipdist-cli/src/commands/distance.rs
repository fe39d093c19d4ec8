use anyhow::{Context, Result};
use serde::Serialize;
use zipdist::{DistanceRequest, DistanceResolver, DistanceResponse, DistanceUnit};

use super::{display_distance, StoreOptions};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OriginOutput<'a> {
    zip_code: &'a str,
    place_name: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DestinationOutput<'a> {
    zip_code: &'a str,
    place_name: &'a str,
    distance: f64,
    unit: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WarningsOutput<'a> {
    not_found: &'a [String],
}

#[derive(Serialize)]
struct DistanceOutput<'a> {
    origin: OriginOutput<'a>,
    destinations: Vec<DestinationOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<WarningsOutput<'a>>,
}

impl<'a> From<&'a DistanceResponse> for DistanceOutput<'a> {
    fn from(response: &'a DistanceResponse) -> Self {
        Self {
            origin: OriginOutput {
                zip_code: &response.origin.postal_code,
                place_name: &response.origin.place_name,
                latitude: response.origin.latitude(),
                longitude: response.origin.longitude(),
            },
            destinations: response
                .destinations
                .iter()
                .map(|result| DestinationOutput {
                    zip_code: &result.location.postal_code,
                    place_name: &result.location.place_name,
                    distance: result.distance,
                    unit: &result.unit,
                    latitude: result.location.latitude(),
                    longitude: result.location.longitude(),
                })
                .collect(),
            warnings: (!response.not_found.is_empty()).then(|| WarningsOutput {
                not_found: &response.not_found,
            }),
        }
    }
}

pub async fn run(
    options: &StoreOptions,
    origin: String,
    to: Vec<String>,
    unit: DistanceUnit,
    json: bool,
) -> Result<()> {
    let request = DistanceRequest::new(origin, to, unit)?;
    let resolver = DistanceResolver::new(options.build().await?);

    let response = resolver
        .resolve(&request)
        .await
        .context("Failed to calculate distances")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&DistanceOutput::from(&response))?
        );
    } else {
        println!(
            "From {} ({})",
            response.origin.postal_code, response.origin.place_name
        );
        for result in &response.destinations {
            println!(
                "  {:<10} {:>14} {:<6} {}",
                result.location.postal_code,
                display_distance(result.distance, request.unit()),
                result.unit,
                result.location.place_name
            );
        }
        if !response.not_found.is_empty() {
            eprintln!("Not found: {}", response.not_found.join(", "));
        }
    }

    Ok(())
}
