use serde_json::Value;
use std::time::Duration;

use super::utils::{print_error, print_success, CliError, CliResult};

fn client() -> CliResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(CliError::from)
}

async fn fetch(admin_url: &str, path: &str) -> CliResult<Value> {
    let url = format!("{}{path}", admin_url.trim_end_matches('/'));
    let response = client()?.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(CliError::Network(format!(
            "{url} returned HTTP {}",
            response.status()
        )));
    }
    let envelope: Value = response.json().await?;
    if envelope["success"] != Value::Bool(true) {
        return Err(CliError::General(format!(
            "server reported failure for {path}"
        )));
    }
    Ok(envelope["data"].clone())
}

pub async fn show_status(admin_url: &str) -> CliResult<()> {
    let poller = fetch(admin_url, "/admin/poller/status").await?;
    let stats = fetch(admin_url, "/admin/cache/stats").await?;

    println!("Poller:");
    println!("  Running: {}", poller["running"]);
    match poller["last_processed_block"].as_u64() {
        Some(block) => println!("  Last processed block: {block}"),
        None => println!("  Last processed block: (not yet initialized)"),
    }
    println!("  Ticks: {}", poller["ticks"]);
    println!("  Events processed: {}", poller["events_processed"]);
    println!("  Fetch failures: {}", poller["fetch_failures"]);
    println!("  Decode failures: {}", poller["decode_failures"]);

    println!("\nCache namespaces:");
    if let Some(namespaces) = stats["namespaces"].as_array() {
        for ns in namespaces {
            println!(
                "  {:<12} size {:>5}  hits {:>8}  misses {:>8}  hit rate {:>5.1}%",
                ns["name"].as_str().unwrap_or("?"),
                ns["size"],
                ns["hits"],
                ns["misses"],
                ns["hit_rate"].as_f64().unwrap_or(0.0)
            );
        }
    }
    Ok(())
}

pub async fn show_health(admin_url: &str) -> CliResult<()> {
    let health = fetch(admin_url, "/admin/health").await?;

    let status = health["status"].as_str().unwrap_or("unknown");
    let score = health["score"].as_u64().unwrap_or(0);
    match status {
        "healthy" => print_success(&format!("Status: healthy (score {score})")),
        "warning" => println!("[WARNING] Status: warning (score {score})"),
        _ => print_error(&format!("Status: {status} (score {score})")),
    }
    println!("Poller running: {}", health["poller_running"]);

    if let Some(namespaces) = health["namespaces"].as_array() {
        println!("\nNamespace hit rates:");
        for ns in namespaces {
            println!(
                "  {:<12} {:>5.1}% ({} hits / {} misses)",
                ns["name"].as_str().unwrap_or("?"),
                ns["hit_rate"].as_f64().unwrap_or(0.0),
                ns["hits"],
                ns["misses"]
            );
        }
    }
    Ok(())
}
