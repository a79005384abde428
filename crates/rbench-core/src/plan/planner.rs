use std::collections::HashMap;

use uuid::Uuid;

use crate::config::BenchConfig;
use crate::error::RbenchError;
use crate::plan::model::{CompositeId, EndpointDetail, RequestDetail, WorkUnit};
use crate::plan::placeholders::format_url;
use crate::providers::EndpointDetailProvider;

/// Expand the configured endpoints into `endpoints × iterations` work units.
///
/// The detail provider is consulted once for the whole batch. A provider that
/// reports [`RbenchError::NotImplemented`] yields default GET requests; any
/// other provider error is returned as-is.
pub async fn plan(
    config: &BenchConfig,
    provider: &dyn EndpointDetailProvider,
) -> Result<Vec<WorkUnit>, RbenchError> {
    let urls = config
        .endpoints
        .iter()
        .map(|e| format_url(e, &config.url_args))
        .collect::<Result<Vec<_>, _>>()?;

    let details = match provider.get_details(config).await {
        Ok(details) => details,
        Err(e) if e.is_not_implemented() => {
            tracing::debug!("Endpoint details unavailable, using defaults: {e}");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    Ok(expand(&config.endpoints, &urls, config.iterations, &details))
}

/// Pure expansion step. `templates[i]` is the configured endpoint and
/// `urls[i]` its substituted form; details are matched against either,
/// ignoring case.
fn expand(
    templates: &[String],
    urls: &[String],
    iterations: u32,
    details: &[EndpointDetail],
) -> Vec<WorkUnit> {
    let mut by_url: HashMap<String, Vec<&EndpointDetail>> = HashMap::new();
    for detail in details {
        by_url
            .entry(detail.url.to_lowercase())
            .or_default()
            .push(detail);
    }

    let mut units = Vec::with_capacity(urls.len() * iterations as usize);

    for (group_idx, (template, url)) in templates.iter().zip(urls).enumerate() {
        let candidates = by_url
            .get(&url.to_lowercase())
            .or_else(|| by_url.get(&template.to_lowercase()));

        for iteration in 1..=iterations {
            let detail = candidates
                .map(|list| pick_detail(list, iteration))
                .map(RequestDetail::from)
                .unwrap_or_default();

            units.push(WorkUnit {
                id: CompositeId::new(group_idx as u32 + 1, iteration),
                operation_id: Uuid::new_v4(),
                endpoint_url: url.clone(),
                detail,
            });
        }
    }

    units
}

/// Iteration `n` uses the `n-1`th detail when the provider returned enough
/// of them, otherwise the first.
fn pick_detail<'a>(list: &[&'a EndpointDetail], iteration: u32) -> &'a EndpointDetail {
    let idx = iteration as usize - 1;
    list.get(idx).copied().unwrap_or(list[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::model::HttpMethod;
    use crate::providers::{NoDetails, StaticDetailProvider};
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FailingProvider;

    #[async_trait]
    impl EndpointDetailProvider for FailingProvider {
        async fn get_details(&self, _config: &BenchConfig) -> Result<Vec<EndpointDetail>, RbenchError> {
            Err(RbenchError::Provider("catalog offline".to_string()))
        }
    }

    fn make_config(endpoints: &[&str], iterations: u32) -> BenchConfig {
        BenchConfig::new(endpoints.iter().map(|e| e.to_string()).collect(), iterations)
    }

    fn detail(url: &str, method: HttpMethod, query: &str) -> EndpointDetail {
        EndpointDetail {
            url: url.to_string(),
            method,
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn two_endpoints_two_iterations() {
        let config = make_config(&["http://a", "http://b"], 2);
        let units = plan(&config, &NoDetails).await.unwrap();

        let ids: Vec<String> = units.iter().map(|u| u.id.to_string()).collect();
        let urls: Vec<&str> = units.iter().map(|u| u.endpoint_url.as_str()).collect();
        assert_eq!(ids, ["1.1", "1.2", "2.1", "2.2"]);
        assert_eq!(urls, ["http://a", "http://a", "http://b", "http://b"]);
    }

    #[tokio::test]
    async fn unit_count_and_ids_are_unique() {
        let config = make_config(&["http://a", "http://b", "http://c"], 7);
        let units = plan(&config, &NoDetails).await.unwrap();
        assert_eq!(units.len(), 21);

        let ids: HashSet<CompositeId> = units.iter().map(|u| u.id).collect();
        assert_eq!(ids.len(), 21);
        for id in ids {
            assert!((1..=3).contains(&id.group));
            assert!((1..=7).contains(&id.iteration));
        }

        let ops: HashSet<Uuid> = units.iter().map(|u| u.operation_id).collect();
        assert_eq!(ops.len(), 21);
    }

    #[tokio::test]
    async fn not_implemented_provider_falls_back_to_get() {
        let config = make_config(&["http://a"], 1);
        let units = plan(&config, &NoDetails).await.unwrap();
        assert_eq!(units[0].detail, RequestDetail::default());
        assert_eq!(units[0].detail.method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn other_provider_errors_propagate() {
        let config = make_config(&["http://a"], 1);
        let err = plan(&config, &FailingProvider).await.unwrap_err();
        assert!(matches!(err, RbenchError::Provider(_)));
    }

    #[tokio::test]
    async fn placeholder_failure_aborts_planning() {
        let config = make_config(&["http://a/{missing}"], 1);
        let err = plan(&config, &NoDetails).await.unwrap_err();
        assert!(matches!(err, RbenchError::Configuration(_)));
    }

    #[tokio::test]
    async fn placeholders_are_substituted_into_units() {
        let mut config = make_config(&["http://{host}/orders"], 1);
        config
            .url_args
            .insert("host".to_string(), "api.local".to_string());
        let units = plan(&config, &NoDetails).await.unwrap();
        assert_eq!(units[0].endpoint_url, "http://api.local/orders");
    }

    #[tokio::test]
    async fn details_match_url_ignoring_case() {
        let config = make_config(&["http://A/Orders"], 1);
        let provider =
            StaticDetailProvider::new(vec![detail("http://a/orders", HttpMethod::Post, "")]);
        let units = plan(&config, &provider).await.unwrap();
        assert_eq!(units[0].detail.method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn details_match_unsubstituted_template() {
        let mut config = make_config(&["http://{host}/x"], 1);
        config.url_args.insert("host".to_string(), "h".to_string());
        let provider =
            StaticDetailProvider::new(vec![detail("http://{host}/x", HttpMethod::Delete, "")]);
        let units = plan(&config, &provider).await.unwrap();
        assert_eq!(units[0].detail.method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn multiple_details_are_picked_by_iteration() {
        let config = make_config(&["http://a"], 3);
        let provider = StaticDetailProvider::new(vec![
            detail("http://a", HttpMethod::Get, "?n=1"),
            detail("http://a", HttpMethod::Get, "?n=2"),
        ]);
        let units = plan(&config, &provider).await.unwrap();
        let queries: Vec<&str> = units.iter().map(|u| u.detail.query.as_str()).collect();
        // Third iteration is out of range and falls back to the first entry.
        assert_eq!(queries, ["?n=1", "?n=2", "?n=1"]);
    }

    #[tokio::test]
    async fn unmatched_endpoint_gets_defaults() {
        let config = make_config(&["http://a", "http://b"], 1);
        let provider =
            StaticDetailProvider::new(vec![detail("http://a", HttpMethod::Post, "")]);
        let units = plan(&config, &provider).await.unwrap();
        assert_eq!(units[0].detail.method, HttpMethod::Post);
        assert_eq!(units[1].detail, RequestDetail::default());
    }

    #[test]
    fn expansion_is_deterministic_apart_from_operation_ids() {
        let templates = vec!["http://a".to_string(), "http://b".to_string()];
        let details = vec![detail("http://b", HttpMethod::Put, "?q")];
        let first = expand(&templates, &templates, 3, &details);
        let second = expand(&templates, &templates, 3, &details);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.endpoint_url, b.endpoint_url);
            assert_eq!(a.detail, b.detail);
        }
    }
}
