//! Analytics service: loads the ledger and runs the pure aggregations from
//! `stockpile_core::analytics`. Nothing is cached; every call sees the
//! ledger as it is at that moment.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::DbResult;
use crate::repository::sale::SaleRepository;
use stockpile_core::analytics::{self, ProductSales, SalesSummary, TimeBucket};
use stockpile_core::Money;

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    sales: SaleRepository,
}

impl AnalyticsService {
    pub fn new(sales: SaleRepository) -> Self {
        AnalyticsService { sales }
    }

    pub async fn total_revenue(&self) -> DbResult<Money> {
        let sales = self.sales.list_all().await?;
        Ok(analytics::total_revenue(&sales)?)
    }

    pub async fn best_selling(&self, top_n: usize) -> DbResult<Vec<ProductSales>> {
        let sales = self.sales.list_all().await?;
        debug!(top_n, ledger = sales.len(), "Ranking best sellers");
        Ok(analytics::best_selling(&sales, top_n)?)
    }

    pub async fn revenue_by_category(&self) -> DbResult<BTreeMap<String, Money>> {
        let sales = self.sales.list_all().await?;
        Ok(analytics::revenue_by_category(&sales)?)
    }

    pub async fn quantity_by_category(&self) -> DbResult<BTreeMap<String, i64>> {
        let sales = self.sales.list_all().await?;
        Ok(analytics::quantity_by_category(&sales)?)
    }

    pub async fn revenue_over_time(&self, bucket: TimeBucket) -> DbResult<BTreeMap<String, Money>> {
        let sales = self.sales.list_all().await?;
        debug!(%bucket, ledger = sales.len(), "Bucketing revenue");
        Ok(analytics::revenue_over_time(&sales, bucket)?)
    }

    pub async fn summary(&self, top_n: usize) -> DbResult<SalesSummary> {
        let sales = self.sales.list_all().await?;
        Ok(analytics::summary(&sales, top_n)?)
    }
}
