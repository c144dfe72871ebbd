//! Report commands. Every report is recomputed from the ledger.

use serde_json::{json, Value};
use stockpile_core::analytics::TimeBucket;
use stockpile_core::Action;

use super::Context;
use crate::cli::AnalyticsCommand;
use crate::error::CliResult;
use crate::output::to_json;

pub async fn run(ctx: &Context, command: AnalyticsCommand) -> CliResult<Value> {
    ctx.session.require(Action::ViewAnalytics)?;
    let analytics = ctx.db.analytics();
    let default_top = ctx.config.inventory.best_sellers;

    match command {
        AnalyticsCommand::Revenue => {
            let total = analytics.total_revenue().await?;
            Ok(json!({
                "total_revenue_cents": total.cents(),
                "total_revenue": total.to_string(),
            }))
        }

        AnalyticsCommand::BestSellers { top } => {
            to_json(&analytics.best_selling(top.unwrap_or(default_top)).await?)
        }

        AnalyticsCommand::ByCategory => to_json(&analytics.revenue_by_category().await?),

        AnalyticsCommand::OverTime { bucket } => {
            let bucket: TimeBucket = bucket.parse()?;
            to_json(&analytics.revenue_over_time(bucket).await?)
        }

        AnalyticsCommand::QuantityByCategory => {
            to_json(&analytics.quantity_by_category().await?)
        }

        AnalyticsCommand::Summary { top } => {
            to_json(&analytics.summary(top.unwrap_or(default_top)).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::error::ErrorCode;
    use chrono::{TimeZone, Utc};
    use stockpile_core::Role;

    async fn with_sales(role: Role) -> Context {
        let ctx = context(role).await;
        let checkout = ctx.db.checkout();
        let at = |m, d| Utc.with_ymd_and_hms(2025, m, d, 12, 0, 0).unwrap();

        checkout.sell_at(1, 3, at(1, 30)).await.unwrap();
        checkout.sell_at(2, 2, at(2, 2)).await.unwrap();
        checkout.sell_at(1, 1, at(2, 14)).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_revenue_and_categories() {
        let ctx = with_sales(Role::Staff).await;

        let revenue = run(&ctx, AnalyticsCommand::Revenue).await.unwrap();
        assert_eq!(revenue["total_revenue_cents"], 4 * 250 + 2 * 199);
        assert_eq!(revenue["total_revenue"], "13.98");

        let by_category = run(&ctx, AnalyticsCommand::ByCategory).await.unwrap();
        assert_eq!(by_category, json!({ "Drinks": 398, "Hardware": 1000 }));

        let units = run(&ctx, AnalyticsCommand::QuantityByCategory).await.unwrap();
        assert_eq!(units, json!({ "Drinks": 2, "Hardware": 4 }));
    }

    #[tokio::test]
    async fn test_best_sellers_default_and_explicit_top() {
        let ctx = with_sales(Role::Staff).await;

        let all = run(&ctx, AnalyticsCommand::BestSellers { top: None }).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(all[0]["product_name"], "Widget");
        assert_eq!(all[0]["quantity_sold"], 4);

        let one = run(&ctx, AnalyticsCommand::BestSellers { top: Some(1) }).await.unwrap();
        assert_eq!(one.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_over_time_buckets() {
        let ctx = with_sales(Role::Staff).await;

        let monthly = run(&ctx, AnalyticsCommand::OverTime { bucket: "MONTHLY".into() })
            .await
            .unwrap();
        assert_eq!(monthly, json!({ "2025-01": 750, "2025-02": 648 }));

        let err = run(&ctx, AnalyticsCommand::OverTime { bucket: "hourly".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_summary() {
        let ctx = with_sales(Role::Admin).await;
        let summary = run(&ctx, AnalyticsCommand::Summary { top: Some(1) }).await.unwrap();

        assert_eq!(summary["sale_count"], 3);
        assert_eq!(summary["units_sold"], 6);
        assert_eq!(summary["best_sellers"].as_array().unwrap().len(), 1);
    }
}
