//! Alert rule fetching.

use crate::api::MonitoringApi;
use crate::model::AlertRule;
use crate::pages::collect_pages;

/// Fetch every monitor. May be incomplete if a page failed.
pub async fn load_rules(api: &dyn MonitoringApi, page_size: u32) -> Vec<AlertRule> {
    collect_pages("monitors", |page| api.list_rules(page, page_size)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{FakeDatadog, rule};

    #[tokio::test]
    async fn loads_every_page() {
        let api = FakeDatadog::new((1..=5).map(|i| rule(&i.to_string(), "msg")).collect());
        let rules = load_rules(&api, 2).await;
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn failing_page_truncates() {
        let api = FakeDatadog::new((1..=5).map(|i| rule(&i.to_string(), "msg")).collect())
            .failing_list_at_page(1);
        let rules = load_rules(&api, 2).await;
        assert_eq!(rules.len(), 2);
    }
}
