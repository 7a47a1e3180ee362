use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// The one JSON envelope every endpoint speaks, success and failure alike.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
    /// Per-field detail for validation failures; omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            message: message.into(),
            data: None,
            meta: Some(Meta::empty()),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_omits_the_errors_key_when_there_is_no_field_detail() {
        let body = serde_json::to_value(ApiResponse::failure("Not Found", None)).unwrap();
        assert_eq!(body["message"], "Not Found");
        assert!(body["data"].is_null());
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn failure_lists_the_offending_fields() {
        let body = serde_json::to_value(ApiResponse::failure(
            "Validation failed",
            Some(vec!["name".into(), "email".into()]),
        ))
        .unwrap();
        assert_eq!(body["errors"][0], "name");
        assert_eq!(body["errors"][1], "email");
    }
}
