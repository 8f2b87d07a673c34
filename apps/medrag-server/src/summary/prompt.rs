//! Prompts for structured medical document analysis

/// Outline of the expected JSON object, embedded in the system prompt
const SCHEMA_OUTLINE: &str = r#"{
  "document_title": string | null,
  "document_date": string | null,
  "patient_details": {
    "name": string | null,
    "age": string | null,
    "gender": string | null,
    "date_of_birth": string | null,
    "patient_id": string | null
  } | null,
  "overall_summary": string,
  "primary_diagnoses": [string],
  "secondary_diagnoses": [string],
  "key_symptoms_presenting": [string],
  "significant_medical_history": [string],
  "medications_administered_or_prescribed": [
    { "name": string, "dosage": string | null, "frequency": string | null,
      "route": string | null, "duration": string | null,
      "reason_for_prescription": string | null }
  ],
  "procedures_performed": [
    { "name": string, "date": string | null,
      "outcome_or_findings": string | null, "physician": string | null }
  ],
  "key_lab_results": [
    { "event_type": string, "description": string, "value": string | null,
      "unit": string | null, "date": string | null,
      "interpretation": string | null }
  ],
  "key_imaging_findings": [ same shape as key_lab_results ],
  "treatment_plan_and_recommendations": string | null,
  "prognosis": string | null,
  "allergies": [string]
}"#;

pub fn system_prompt() -> String {
    format!(
        "You are an expert medical data analyst. Your task is to meticulously analyze the \
         provided medical document context and extract information to populate a structured \
         JSON object. ADHERE STRICTLY to the schema of the 'MedicalDocumentAnalysis' object \
         below. Populate ALL fields based only on the information present in the provided \
         document context. The field 'overall_summary' is REQUIRED and must always be present \
         as a concise summary of the document (3-5 sentences). If information for a field is \
         not present, set its value to null or use an empty list. Ensure dates are in \
         YYYY-MM-DD format if possible. Be precise and comprehensive.\n\n\
         MedicalDocumentAnalysis schema:\n{}",
        SCHEMA_OUTLINE
    )
}

pub fn user_prompt(context: &str, query: Option<&str>) -> String {
    let mut prompt = format!(
        "Please analyze the following medical document content and extract the information \
         into the 'MedicalDocumentAnalysis' JSON structure.\n\n\
         DOCUMENT CONTEXT:\n{}\n\n",
        context
    );

    if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
        prompt.push_str(&format!(
            "QUESTION:\n{}\nThe 'overall_summary' field must answer this question using only \
             the document context.\n\n",
            query
        ));
    }

    prompt.push_str(
        "Ensure your output is a single, valid JSON object matching the \
         'MedicalDocumentAnalysis' schema, and that 'overall_summary' is always included.",
    );
    prompt
}
