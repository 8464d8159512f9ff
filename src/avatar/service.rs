use reqwest::Url;

use crate::utils::error::CustomError;

/// Proxies identicon SVGs from an upstream avatar API.
#[derive(Clone)]
pub struct AvatarService {
    client: reqwest::Client,
    base_url: String,
}

impl AvatarService {
    pub fn new(base_url: &str) -> Self {
        AvatarService {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn avatar_url(&self, identifier: &str) -> Result<Url, CustomError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CustomError::InternalServerError(format!("Invalid avatar API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CustomError::InternalServerError("Avatar API URL cannot be a base".into()))?
            .pop_if_empty()
            .push(&format!("{}.svg", identifier));
        Ok(url)
    }

    pub async fn fetch_svg(&self, identifier: &str) -> Result<String, CustomError> {
        let url = self.avatar_url(identifier)?;

        let response = self
            .client
            .get(url)
            .header("Accept", "image/svg+xml")
            .send()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to fetch avatar: {}", e)))?;

        if !response.status().is_success() {
            return Err(CustomError::InternalServerError(format!(
                "Avatar API responded with {}",
                response.status()
            )));
        }

        let svg = response
            .text()
            .await
            .map_err(|e| CustomError::InternalServerError(format!("Failed to read avatar: {}", e)))?;

        if !svg.contains("<svg") {
            return Err(CustomError::InternalServerError(
                "Invalid SVG content received".into(),
            ));
        }
        Ok(svg)
    }
}

/// Grey square showing the identifier's first letter, uppercased.
pub fn fallback_svg(identifier: &str) -> String {
    let letter = identifier
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| "?".to_string());
    let letter = match letter.as_str() {
        "<" => "&lt;".to_string(),
        ">" => "&gt;".to_string(),
        "&" => "&amp;".to_string(),
        _ => letter,
    };

    format!(
        r##"<svg width="100" height="100" xmlns="http://www.w3.org/2000/svg"><rect width="100" height="100" fill="#E2E8F0"/><text x="50%" y="50%" font-size="40" text-anchor="middle" dy=".3em" fill="#718096">{}</text></svg>"##,
        letter
    )
}
