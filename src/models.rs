// Request and response bodies for the HTTP API

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// Item classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemType {
    Art,
    Antique,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Art => "Art",
            ItemType::Antique => "Antique",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    /// Accepts model output such as `"Art"`, `antique.` or `**Art**`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_ascii_lowercase();
        match normalized.as_str() {
            "art" => Ok(ItemType::Art),
            "antique" => Ok(ItemType::Antique),
            _ => Err(format!("expected Art or Antique, got '{}'", s.trim())),
        }
    }
}

// Request Types
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyItemRequest {
    pub image_url: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnalysisRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceAnalysisRequest {
    pub session_id: Option<String>,
    pub analysis_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratePdfRequest {
    #[serde(rename = "postId", default, deserialize_with = "string_or_number")]
    pub post_id: Option<String>,
    #[serde(rename = "session_ID")]
    pub session_id: Option<String>,
}

/// WordPress post ids arrive as either `123` or `"123"`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(Raw::Number(number)) => Some(number.to_string()),
        None => None,
    })
}

// Response Types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub success: bool,
    pub session_id: String,
    pub customer_image_url: String,
    pub similar_image_urls: Vec<String>,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyItemResponse {
    pub success: bool,
    pub classification: ItemType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAnalysisResponse {
    pub success: bool,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceAnalysisResponse {
    pub success: bool,
    pub enhanced_analysis: String,
    pub offer_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfResponse {
    pub success: bool,
    pub message: String,
    pub pdf_link: String,
    pub doc_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub service: String,
    pub version: String,
}

// Failure body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_serialization() {
        assert_eq!(serde_json::to_string(&ItemType::Art).unwrap(), r#""Art""#);
        assert_eq!(
            serde_json::to_string(&ItemType::Antique).unwrap(),
            r#""Antique""#
        );
    }

    #[test]
    fn test_item_type_parsing_normalizes_model_output() {
        assert_eq!("Art".parse::<ItemType>().unwrap(), ItemType::Art);
        assert_eq!(" antique.\n".parse::<ItemType>().unwrap(), ItemType::Antique);
        assert_eq!("\"Antique\"".parse::<ItemType>().unwrap(), ItemType::Antique);
        assert_eq!("**ART**".parse::<ItemType>().unwrap(), ItemType::Art);
        assert!("Artwork".parse::<ItemType>().is_err());
        assert!("This is an antique chair".parse::<ItemType>().is_err());
        assert!("".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_classify_request_accepts_either_field() {
        let request: ClassifyItemRequest =
            serde_json::from_str(r#"{"imageUrl":"https://example.com/a.jpg"}"#).unwrap();
        assert_eq!(request.image_url.as_deref(), Some("https://example.com/a.jpg"));
        assert!(request.session_id.is_none());

        let request: ClassifyItemRequest = serde_json::from_str(r#"{"sessionId":"abc"}"#).unwrap();
        assert_eq!(request.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_generate_pdf_request_post_id_forms() {
        let request: GeneratePdfRequest = serde_json::from_str(r#"{"postId":142}"#).unwrap();
        assert_eq!(request.post_id.as_deref(), Some("142"));

        let request: GeneratePdfRequest =
            serde_json::from_str(r#"{"postId":"142","session_ID":"s-1"}"#).unwrap();
        assert_eq!(request.post_id.as_deref(), Some("142"));
        assert_eq!(request.session_id.as_deref(), Some("s-1"));

        let request: GeneratePdfRequest = serde_json::from_str(r#"{"postId":"  "}"#).unwrap();
        assert!(request.post_id.is_none());

        let request: GeneratePdfRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(request.post_id.is_none());
    }

    #[test]
    fn test_upload_response_uses_camel_case() {
        let response = UploadImageResponse {
            success: true,
            session_id: "s-1".to_string(),
            customer_image_url: "https://example.com/a.jpg".to_string(),
            similar_image_urls: vec!["https://example.com/b.jpg".to_string()],
            item_type: ItemType::Antique,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["sessionId"], "s-1");
        assert_eq!(value["customerImageUrl"], "https://example.com/a.jpg");
        assert_eq!(value["similarImageUrls"][0], "https://example.com/b.jpg");
        assert_eq!(value["itemType"], "Antique");
    }

    #[test]
    fn test_enhance_response_uses_camel_case() {
        let response = EnhanceAnalysisResponse {
            success: true,
            enhanced_analysis: "Enhanced".to_string(),
            offer_text: "Offer".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["enhancedAnalysis"], "Enhanced");
        assert_eq!(value["offerText"], "Offer");
    }

    #[test]
    fn test_error_response_omits_missing_detail() {
        let response = ErrorResponse {
            success: false,
            message: "Error classifying item".to_string(),
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"success\":false"));
    }
}
