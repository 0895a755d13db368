use eyre::Result;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

pub enum Auth {
    /// Use a bearer token via the Authorization header
    Bearer(String),
    /// Don't use any authentication
    None,
}

impl Auth {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Default headers carrying this authentication
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Self::Bearer(token) = self {
            let mut value: HeaderValue = format!("Bearer {}", token).parse()?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => write!(f, "Bearer"),
            Self::None => write!(f, "None"),
        }
    }
}
