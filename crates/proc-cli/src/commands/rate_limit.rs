use proc_client::RateLimit;
use serde_json::{Value, json};

use super::Context;
use crate::error::CliResult;

/// Pings the evaluator and prints the rate limit it reports.
pub async fn execute(context: &Context) -> CliResult<()> {
    let rate_limit = context.client.refresh_rate_limit().await?;
    context.print(&describe(&rate_limit))
}

fn describe(rate_limit: &RateLimit) -> Value {
    json!({
        "limit": rate_limit.limit,
        "window": rate_limit.window.map(|window| window.as_str()),
        "reset": rate_limit.reset_at.map(|reset| reset.to_rfc3339()),
    })
}
