use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use werkbank_core::Claims;

/// Allowance for clock drift between services when checking `exp`.
const LEEWAY_SECS: u64 = 60;

/// Symmetric secrets shorter than this are refused at startup.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("jwt secret must be at least {MIN_SECRET_LEN} characters")]
    WeakSecret,
    #[error("invalid token")]
    InvalidToken,
}

/// Validates bearer tokens against the shared symmetric secret.
///
/// Issuer and audience both carry the configured issuer string. Every
/// failure mode (malformed, bad signature, expired, wrong issuer) collapses
/// into `InvalidToken`; the caller decides what that means for the request.
pub struct TokenValidator {
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &str, issuer: &str) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[issuer]);
        validation.leeway = LEEWAY_SECS;
        Ok(Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const ISSUER: &str = "Werkbank";

    fn now_secs() -> usize {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
    }

    fn claims(iss: &str, aud: &str, exp: usize) -> Claims {
        Claims {
            sub: "5f0c6b5e-3a48-4c9f-8d01-0000000000aa".to_string(),
            name: Some("Erika Muster".to_string()),
            roles: vec!["Admin".to_string()],
            iss: iss.to_string(),
            aud: aud.to_string(),
            exp,
        }
    }

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn short_secret_is_refused() {
        assert!(matches!(
            TokenValidator::new("too-short", ISSUER),
            Err(AuthError::WeakSecret)
        ));
    }

    #[test]
    fn valid_token_yields_its_claims() {
        let validator = TokenValidator::new(SECRET, ISSUER).unwrap();
        let claims = claims(ISSUER, ISSUER, now_secs() + 3_600);
        let validated = validator.validate(&token(&claims, SECRET)).unwrap();
        assert_eq!(validated, claims);
    }

    #[test]
    fn wrong_signature_is_invalid() {
        let validator = TokenValidator::new(SECRET, ISSUER).unwrap();
        let claims = claims(ISSUER, ISSUER, now_secs() + 3_600);
        let forged = token(&claims, "ffffffffffffffffffffffffffffffff");
        assert!(validator.validate(&forged).is_err());
    }

    #[test]
    fn expired_token_is_invalid_beyond_the_leeway() {
        let validator = TokenValidator::new(SECRET, ISSUER).unwrap();
        let expired = claims(ISSUER, ISSUER, now_secs() - 3_600);
        assert!(validator.validate(&token(&expired, SECRET)).is_err());

        // Inside the one-minute leeway the token still passes.
        let drifting = claims(ISSUER, ISSUER, now_secs() - 30);
        assert!(validator.validate(&token(&drifting, SECRET)).is_ok());
    }

    #[test]
    fn wrong_issuer_or_audience_is_invalid() {
        let validator = TokenValidator::new(SECRET, ISSUER).unwrap();
        let exp = now_secs() + 3_600;
        assert!(validator
            .validate(&token(&claims("Other", ISSUER, exp), SECRET))
            .is_err());
        assert!(validator
            .validate(&token(&claims(ISSUER, "Other", exp), SECRET))
            .is_err());
    }

    #[test]
    fn garbage_input_is_invalid_not_a_panic() {
        let validator = TokenValidator::new(SECRET, ISSUER).unwrap();
        assert!(validator.validate("not-a-jwt").is_err());
        assert!(validator.validate("").is_err());
    }
}
