use anyhow::Context;

use ridebook_client::{BookingClient, ClientConfig};
use ridebook_core::PageQuery;

/// `ridebook [rides|routes] [page] [limit]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ridebook_observability::init();

    let mut args = std::env::args().skip(1);
    let collection = args.next().unwrap_or_else(|| "rides".to_string());
    let page = parse_arg(args.next(), 1, "page")?;
    let limit = parse_arg(args.next(), 10, "limit")?;
    let query = PageQuery::new(page, limit)?;

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url(), "starting ridebook probe");
    let client = BookingClient::new(config)?;

    match client.bootstrap().await {
        Some(identity) => tracing::info!(user_id = %identity.id, role = %identity.role, "signed in"),
        None => tracing::info!("browsing anonymously"),
    }

    let resources = client.resources();
    let rendered = match collection.as_str() {
        "rides" => {
            client.fetch_rides(&query).await;
            serde_json::to_string_pretty(&resources.rides.state())?
        }
        "routes" => {
            client.fetch_routes(&query).await;
            serde_json::to_string_pretty(&resources.routes.state())?
        }
        other => anyhow::bail!("unknown collection '{other}' (expected rides or routes)"),
    };
    println!("{rendered}");

    Ok(())
}

fn parse_arg(raw: Option<String>, default: u32, name: &str) -> anyhow::Result<u32> {
    match raw {
        Some(raw) => raw.parse().with_context(|| format!("invalid {name} '{raw}'")),
        None => Ok(default),
    }
}
