//! Estimates air quality at a point between stations, then asks for advice and
//! the past week's history.
//!
//! Run with `RUST_LOG=info cargo run --example estimate_point -- 22.45 73.35`.

use rural_aqi::{LatLon, RuralAqi, RuralAqiError, Settings};
use std::env;

#[tokio::main]
async fn main() -> Result<(), RuralAqiError> {
    env_logger::init();

    let args: Vec<f64> = env::args().skip(1).filter_map(|a| a.parse().ok()).collect();
    let location = match args.as_slice() {
        [lat, lon] => LatLon(*lat, *lon),
        _ => LatLon(22.45, 73.35),
    };

    let client = RuralAqi::with_defaults(Settings::default())?;
    let estimate = client.estimate().location(location).call().await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&estimate.to_response()).unwrap_or_default()
    );

    match client.advise(&estimate).await {
        Ok(advice) => println!("\nAdvice: {}", advice),
        Err(e) => eprintln!("\nNo advice available: {}", e),
    }

    match client.history(location).await {
        Ok(days) => {
            println!("\nPast week:");
            for day in days {
                println!("  {}  {:>3}  {}", day.date, day.overall_index, day.dominant_pollutant);
            }
        }
        Err(e) => eprintln!("\nNo history available: {}", e),
    }

    Ok(())
}
