use anyhow::{bail, Context, Result};
use serde::Serialize;
use zipdist::{DistanceResolver, Location};

use super::StoreOptions;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupOutput<'a> {
    zip_code: &'a str,
    place_name: &'a str,
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    county: Option<&'a str>,
}

impl<'a> From<&'a Location> for LookupOutput<'a> {
    fn from(location: &'a Location) -> Self {
        Self {
            zip_code: &location.postal_code,
            place_name: &location.place_name,
            latitude: location.latitude(),
            longitude: location.longitude(),
            state: location.state.as_deref(),
            state_code: location.state_code.as_deref(),
            county: location.county.as_deref(),
        }
    }
}

pub async fn run(options: &StoreOptions, code: &str, json: bool) -> Result<()> {
    let resolver = DistanceResolver::new(options.build().await?);

    let Some(location) = resolver
        .lookup(code)
        .await
        .context("Failed to look up postal code")?
    else {
        bail!("Postal code not found: {}", code);
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&LookupOutput::from(&location))?
        );
    } else {
        println!("Postal code: {}", location.postal_code);
        println!("Place:       {}", location.place_name);
        println!(
            "Coordinates: {:.4}, {:.4}",
            location.latitude(),
            location.longitude()
        );
        if let Some(state) = &location.state {
            match &location.state_code {
                Some(code) => println!("State:       {} ({})", state, code),
                None => println!("State:       {}", state),
            }
        }
        if let Some(county) = &location.county {
            println!("County:      {}", county);
        }
    }

    Ok(())
}
