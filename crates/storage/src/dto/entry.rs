use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitEntryRequest {
    #[validate(url)]
    #[validate(length(max = 2000))]
    pub url: String,
}

/// `score: null` clears a previously set score.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreEntryRequest {
    pub score: Option<Decimal>,
}

impl ScoreEntryRequest {
    pub fn validate_score(&self) -> Result<(), &'static str> {
        match self.score {
            Some(score) if score < Decimal::ZERO => Err("Score must not be negative"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_url_must_be_a_url() {
        let bad = SubmitEntryRequest {
            url: "not a link".to_string(),
        };
        assert!(bad.validate().is_err());

        let good = SubmitEntryRequest {
            url: "https://media.giphy.com/media/abc/giphy.gif".to_string(),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_negative_score_rejected() {
        assert!(ScoreEntryRequest { score: Some(Decimal::from(-1)) }.validate_score().is_err());
        assert!(ScoreEntryRequest { score: Some(Decimal::ZERO) }.validate_score().is_ok());
        assert!(ScoreEntryRequest { score: None }.validate_score().is_ok());
    }
}
