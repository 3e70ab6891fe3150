use super::ApiError;

pub fn validate_prompt(prompt: Option<&str>) -> Result<&str, ApiError> {
    match prompt {
        Some(p) if !p.trim().is_empty() => Ok(p),
        _ => Err(ApiError::validation("prompt is required")),
    }
}

pub fn validate_image(image: Option<&str>) -> Result<&str, ApiError> {
    match image.map(crate::clients::ai_proxy::strip_data_uri) {
        Some(data) if !data.trim().is_empty() => Ok(data),
        _ => Err(ApiError::validation("imageBase64 is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_prompt() {
        assert_eq!(validate_prompt(Some("hello")).unwrap(), "hello");
        assert!(validate_prompt(Some("  ")).is_err());
        assert!(validate_prompt(None).is_err());
    }

    #[test]
    fn test_validate_image_strips_header() {
        assert_eq!(
            validate_image(Some("data:image/jpeg;base64,QUJD")).unwrap(),
            "QUJD"
        );
        assert!(validate_image(Some("data:image/png;base64,")).is_err());
        assert!(validate_image(None).is_err());
    }
}
