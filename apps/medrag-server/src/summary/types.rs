//! Structured analysis types
//!
//! Deserializing a model reply into [`MedicalDocumentAnalysis`] is the schema
//! check: required fields must be present with the right type, absent lists
//! default to empty, unknown fields are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    #[serde(default)]
    pub name: Option<String>,
    /// e.g. "35 years", "6 months"
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// Medical record number or other identifier
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// A lab result, imaging finding, or other dated observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalEvent {
    pub event_type: String,
    pub description: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// e.g. "Normal", "Abnormal", "Critical"
    #[serde(default)]
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub reason_for_prescription: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub outcome_or_findings: Option<String>,
    #[serde(default)]
    pub physician: Option<String>,
}

/// Structured analysis of one medical document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalDocumentAnalysis {
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(default)]
    pub document_date: Option<String>,
    #[serde(default)]
    pub patient_details: Option<PatientDetails>,

    /// Always present
    pub overall_summary: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub primary_diagnoses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub secondary_diagnoses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_symptoms_presenting: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub significant_medical_history: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub medications_administered_or_prescribed: Vec<Medication>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub procedures_performed: Vec<Procedure>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_lab_results: Vec<MedicalEvent>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_imaging_findings: Vec<MedicalEvent>,

    #[serde(default)]
    pub treatment_plan_and_recommendations: Option<String>,
    #[serde(default)]
    pub prognosis: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub allergies: Vec<String>,
}

/// Models sometimes send `null` for an empty list
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_analysis() {
        let analysis: MedicalDocumentAnalysis =
            serde_json::from_str(r#"{"overall_summary": "Routine visit."}"#).unwrap();
        assert_eq!(analysis.overall_summary, "Routine visit.");
        assert!(analysis.patient_details.is_none());
        assert!(analysis.primary_diagnoses.is_empty());
        assert!(analysis.key_lab_results.is_empty());
    }

    #[test]
    fn test_null_lists_and_unknown_fields() {
        let analysis: MedicalDocumentAnalysis = serde_json::from_str(
            r#"{"overall_summary": "x", "allergies": null, "confidence": 0.9}"#,
        )
        .unwrap();
        assert!(analysis.allergies.is_empty());
    }

    #[test]
    fn test_missing_summary_fails() {
        let result: Result<MedicalDocumentAnalysis, _> =
            serde_json::from_str(r#"{"primary_diagnoses": ["Flu"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_required_fields() {
        let result: Result<MedicalDocumentAnalysis, _> = serde_json::from_str(
            r#"{"overall_summary": "x", "medications_administered_or_prescribed": [{"dosage": "5mg"}]}"#,
        );
        assert!(result.is_err());

        let analysis: MedicalDocumentAnalysis = serde_json::from_str(
            r#"{
                "overall_summary": "x",
                "key_lab_results": [
                    {"event_type": "Lab Result", "description": "HbA1c", "value": "7.2", "unit": "%"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(analysis.key_lab_results[0].unit.as_deref(), Some("%"));
        assert!(analysis.key_lab_results[0].interpretation.is_none());
    }

    #[test]
    fn test_serializes_nulls() {
        let analysis: MedicalDocumentAnalysis =
            serde_json::from_str(r#"{"overall_summary": "x"}"#).unwrap();
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value["prognosis"].is_null());
        assert_eq!(value["allergies"], serde_json::json!([]));
    }
}
