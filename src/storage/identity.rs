use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::IdentityProvider;

/// Role allowed to add and remove videos.
pub const DOCTOR_ROLE: &str = "doctor";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: String,
}

impl Actor {
    pub fn is_doctor(&self) -> bool {
        self.role == DOCTOR_ROLE
    }
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor {
            id: claims.user_id,
            role: claims.role,
        }
    }
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

/// Identity of the request being served, resolved once by the auth middleware.
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity {
    claims: Option<Claims>,
}

impl SessionIdentity {
    pub fn new(claims: Option<Claims>) -> Self {
        Self { claims }
    }

    pub fn actor(&self) -> Option<Actor> {
        self.claims.clone().map(Actor::from)
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_actor(&self) -> anyhow::Result<Option<Actor>> {
        Ok(self.actor())
    }
}

#[cfg(test)]
pub fn issue_token(user_id: &str, role: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: format!("{}@example.com", user_id),
        user_id: user_id.to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
