//! Metrics document types, deserialized from the pre-computed dashboard JSON.
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Top level document: generation metadata plus one report per fund.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsDocument {
    pub metadata: DocumentMetadata,
    pub fund2: FundReport,
    pub fund3: FundReport,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentMetadata {
    pub generated_date: String,
    #[serde(default)]
    pub data_period: Option<String>,
    #[serde(default)]
    pub source_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FundReport {
    pub metrics: MetricsSnapshot,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "Q4_2024")]
    pub q4_2024: QuarterMetrics,
    #[serde(rename = "Q1_2025")]
    pub q1_2025: QuarterMetrics,
    #[serde(rename = "Q2_2025")]
    pub q2_2025: QuarterMetrics,
    pub q2_summary: QuarterSummary,
    pub risk_metrics: RiskMetrics,
    #[serde(default, deserialize_with = "ordered_buckets")]
    pub expiry_analysis: Vec<ExpiryBucket>,
    #[serde(default)]
    pub top_properties: Vec<PropertyRent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuarterMetrics {
    #[serde(deserialize_with = "null_as_zero")]
    pub total_sf: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub properties: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub monthly_revenue: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub annual_revenue: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub avg_rent_psf: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub occupancy_rate: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub walt: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub vacant_sf: f64,
    pub period: Option<String>,
    pub total_leases: Option<f64>,
    pub occupied_leases: Option<f64>,
    pub vacant_leases: Option<f64>,
    pub occupied_sf: Option<f64>,
    pub near_term_expiry_sf: Option<f64>,
    pub near_term_expiry_pct: Option<f64>,
}

/// Quarter-over-quarter movement for Q2 2025 against Q1 2025.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuarterSummary {
    #[serde(deserialize_with = "null_as_zero")]
    pub net_absorption: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub new_leases: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub lost_leases: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub occupancy_change: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub walt_change: f64,
    /// Percent change in annual revenue.
    #[serde(deserialize_with = "null_as_zero")]
    pub revenue_change: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskMetrics {
    pub risk_level: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub unique_tenants: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub overall_risk_score: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub top_5_concentration: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub top_10_concentration: f64,
}

/// One lease-expiration period. `label` is the key it had in the document.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ExpiryBucket {
    #[serde(skip)]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub sf: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub annual_rent: f64,
    #[serde(default)]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PropertyRent {
    pub property: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub annual_rent: f64,
    #[serde(default)]
    pub prop_code: Option<String>,
    #[serde(default)]
    pub total_sf: Option<f64>,
    #[serde(default)]
    pub has_vacancy: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub message: String,
    pub recommendation: String,
}

// The generator emits `null` for NaN aggregates.
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

fn ordered_buckets<'de, D>(deserializer: D) -> Result<Vec<ExpiryBucket>, D::Error>
where
    D: Deserializer<'de>,
{
    struct BucketsVisitor;

    impl<'de> Visitor<'de> for BucketsVisitor {
        type Value = Vec<ExpiryBucket>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of expiration period to {sf, annual_rent}")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut buckets = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, mut bucket)) = map.next_entry::<String, ExpiryBucket>()? {
                bucket.label = label;
                buckets.push(bucket);
            }
            Ok(buckets)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(BucketsVisitor)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const SAMPLE_JSON: &str = include_str!("../../tests/data/dashboard_data.json");

    pub fn sample_document() -> MetricsDocument {
        serde_json::from_str(SAMPLE_JSON).expect("sample document should parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_deserialization() {
        let doc = fixtures::sample_document();

        assert_eq!(doc.metadata.generated_date, "2025-07-15 09:30:00");
        assert_eq!(doc.metadata.data_period.as_deref(), Some("Q2 2025"));
        assert_eq!(doc.metadata.source_files.len(), 3);

        let m = &doc.fund2.metrics;
        assert_eq!(m.q2_2025.occupancy_rate, 88.5);
        assert_eq!(m.q1_2025.vacant_sf, 1_150_000.0);
        assert_eq!(m.q2_2025.period.as_deref(), Some("Q2 2025"));
        assert_eq!(m.risk_metrics.risk_level, "Medium-High");
        assert_eq!(m.top_properties.len(), 12);
        assert_eq!(doc.fund2.insights.len(), 2);
        assert_eq!(doc.fund2.insights[0].kind, "warning");
    }

    #[test]
    fn test_expiry_analysis_keeps_document_order() {
        let doc = fixtures::sample_document();
        let labels: Vec<&str> = doc
            .fund3
            .metrics
            .expiry_analysis
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "0-6 months",
                "6-12 months",
                "12-24 months",
                "24-36 months",
                "36+ months"
            ]
        );
        assert_eq!(doc.fund3.metrics.expiry_analysis[0].count, Some(14.0));
    }

    #[test]
    fn test_null_numeric_fields_become_zero() {
        let json = r#"{
            "total_sf": null,
            "properties": 12,
            "monthly_revenue": 1000.5,
            "annual_revenue": null,
            "avg_rent_psf": 8.25,
            "occupancy_rate": 91.0,
            "walt": null
        }"#;
        let q: QuarterMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(q.total_sf, 0.0);
        assert_eq!(q.annual_revenue, 0.0);
        assert_eq!(q.walt, 0.0);
        // Missing entirely
        assert_eq!(q.vacant_sf, 0.0);
        assert_eq!(q.properties, 12.0);
        assert!(q.occupied_sf.is_none());
    }

    #[test]
    fn test_missing_quarter_is_rejected() {
        let json = r#"{
            "Q4_2024": {}, "Q1_2025": {},
            "q2_summary": {}, "risk_metrics": {}
        }"#;
        let result: Result<MetricsSnapshot, _> = serde_json::from_str(json);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Q2_2025"));
    }

    #[test]
    fn test_insight_type_field() {
        let json = r#"{"type": "danger", "category": "Risk",
            "message": "Portfolio risk level is High",
            "recommendation": "Immediate executive attention required"}"#;
        let insight: Insight = serde_json::from_str(json).unwrap();
        assert_eq!(insight.kind, "danger");
        assert_eq!(insight.category, "Risk");
    }
}
